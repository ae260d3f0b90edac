//! Booking operations the model may invoke
//!
//! Tools are stateless singletons; everything a call needs (which thread it
//! serves, the clinic backend, today's date) arrives through [`ToolContext`].

mod args;
mod book_appointment;
mod calculate_date;
mod cancel_appointment;
mod check_schedule;
mod doctor_list;
mod list_appointments;

pub use book_appointment::BookAppointmentTool;
pub use calculate_date::CalculateDateTool;
pub use cancel_appointment::CancelAppointmentTool;
pub use check_schedule::CheckScheduleTool;
pub use doctor_list::DoctorListTool;
pub use list_appointments::ListAppointmentsTool;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::clinic::ClinicBackend;
use crate::llm::{ModelRegistry, ToolDefinition};
use crate::session::OperationResult;

/// Result from tool execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub success: bool,
    pub output: Value,
}

impl ToolOutput {
    pub fn success(output: impl Into<Value>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: Value::String(message.into()),
        }
    }

    /// Serialize a structured result
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(output) => Self::success(output),
            Err(e) => Self::error(format!("Failed to serialize result: {e}")),
        }
    }

    /// Pair this output with the request it answers
    pub fn into_result(self, request_id: impl Into<String>) -> OperationResult {
        if self.success {
            OperationResult::success(request_id, self.output)
        } else {
            let message = match self.output {
                Value::String(s) => s,
                other => other.to_string(),
            };
            OperationResult::error(request_id, message)
        }
    }
}

/// All context needed for a tool invocation
#[derive(Clone)]
pub struct ToolContext {
    /// The thread this call serves; its id is the booking user id
    pub thread_id: String,

    /// Reference date for relative date hints
    pub today: NaiveDate,

    clinic: Arc<dyn ClinicBackend>,

    /// LLM registry for tools that need model access
    llm_registry: Arc<ModelRegistry>,
}

impl ToolContext {
    pub fn new(
        thread_id: String,
        today: NaiveDate,
        clinic: Arc<dyn ClinicBackend>,
        llm_registry: Arc<ModelRegistry>,
    ) -> Self {
        Self {
            thread_id,
            today,
            clinic,
            llm_registry,
        }
    }

    pub fn clinic(&self) -> &Arc<dyn ClinicBackend> {
        &self.clinic
    }

    pub fn llm_registry(&self) -> &Arc<ModelRegistry> {
        &self.llm_registry
    }

    /// Resolve the user id a call acts for.
    ///
    /// The thread id is authoritative; a different id supplied by the model
    /// is logged and ignored so one thread cannot act on another's bookings.
    pub fn user_id(&self, requested: Option<&str>) -> String {
        if let Some(requested) = requested.filter(|r| *r != self.thread_id) {
            tracing::warn!(
                thread_id = %self.thread_id,
                requested = %requested,
                "Ignoring user_id that does not match the thread"
            );
        }
        self.thread_id.clone()
    }
}

/// Trait for operations the model can call
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as advertised to the model
    fn name(&self) -> &str;

    /// Tool description for the model
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool; failures are reported in the output, never raised
    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput;
}

/// The named operations available to the model
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// The six booking operations
    pub fn standard() -> Self {
        Self {
            tools: vec![
                Arc::new(DoctorListTool),
                Arc::new(CheckScheduleTool),
                Arc::new(CalculateDateTool),
                Arc::new(BookAppointmentTool),
                Arc::new(CancelAppointmentTool),
                Arc::new(ListAppointmentsTool),
            ],
        }
    }

    /// Get all tool definitions for the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a tool by name. `None` when no tool has that name.
    pub async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> Option<ToolOutput> {
        let tool = self.tools.iter().find(|t| t.name() == name)?;
        Some(tool.run(input, ctx).await)
    }
}
