//! List the user's live appointments

use super::args;
use super::{Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct ListAppointmentsTool;

#[derive(Debug, Default, Deserialize)]
struct ListAppointmentsInput {
    #[serde(default, deserialize_with = "args::optional_text")]
    user_id: Option<String>,
}

#[async_trait]
impl Tool for ListAppointmentsTool {
    fn name(&self) -> &'static str {
        "get_appointment_list"
    }

    fn description(&self) -> String {
        "List the user's current (not cancelled) appointments with id, doctor, date, patient name and serial number.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": {
                    "type": "string",
                    "description": "The user_id given at the start of the conversation"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: ListAppointmentsInput = if input.is_null() {
            ListAppointmentsInput::default()
        } else {
            match serde_json::from_value(input) {
                Ok(i) => i,
                Err(e) => return ToolOutput::error(format!("Invalid input: {e}")),
            }
        };

        let user_id = ctx.user_id(input.user_id.as_deref());
        match ctx.clinic().list_appointments(&user_id).await {
            Ok(appointments) => ToolOutput::json(&appointments),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}
