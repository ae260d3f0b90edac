//! Cancel one of the user's appointments

use super::args;
use super::{Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct CancelAppointmentTool;

#[derive(Debug, Deserialize)]
struct CancelAppointmentInput {
    #[serde(deserialize_with = "args::integer")]
    appointment_id: i64,
    #[serde(default, deserialize_with = "args::optional_text")]
    user_id: Option<String>,
}

#[async_trait]
impl Tool for CancelAppointmentTool {
    fn name(&self) -> &'static str {
        "cancel_doctor_appointment"
    }

    fn description(&self) -> String {
        "Cancel an existing appointment by its id. Use get_appointment_list to find the id.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["appointment_id"],
            "properties": {
                "appointment_id": {
                    "type": "integer",
                    "description": "Id of the appointment to cancel"
                },
                "user_id": {
                    "type": "string",
                    "description": "The user_id given at the start of the conversation"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: CancelAppointmentInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("Invalid input: {e}")),
        };

        let user_id = ctx.user_id(input.user_id.as_deref());
        match ctx
            .clinic()
            .cancel_appointment(input.appointment_id, &user_id)
            .await
        {
            Ok(()) => ToolOutput::success(json!({"message": "Appointment cancelled successfully"})),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}
