//! Check whether a date falls on one of a doctor's working days

use super::{Tool, ToolContext, ToolOutput};
use crate::schedule::{resolve_hint, AvailabilityPattern};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct CheckScheduleTool;

#[derive(Debug, Deserialize)]
struct CheckScheduleInput {
    appointment_date: String,
    doctor_availability: String,
}

#[async_trait]
impl Tool for CheckScheduleTool {
    fn name(&self) -> &'static str {
        "is_appointment_date_in_schedule"
    }

    fn description(&self) -> String {
        "Check whether an appointment date falls on one of the doctor's available weekdays. Returns true or false.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["appointment_date", "doctor_availability"],
            "properties": {
                "appointment_date": {
                    "type": "string",
                    "description": "The date to check, e.g. '2026-03-09' or 'Mon, March 09, 2026'"
                },
                "doctor_availability": {
                    "type": "string",
                    "description": "The doctor's availability exactly as listed, e.g. 'Mon-Fri 9AM-5PM'"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: CheckScheduleInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("Invalid input: {e}")),
        };

        let pattern = match AvailabilityPattern::parse(&input.doctor_availability) {
            Ok(p) => p,
            Err(e) => return ToolOutput::error(e.to_string()),
        };
        let Some(date) = resolve_hint(&input.appointment_date, ctx.today) else {
            return ToolOutput::error(format!("Cannot parse date '{}'", input.appointment_date));
        };

        ToolOutput::success(pattern.contains(date))
    }
}
