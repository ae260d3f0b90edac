//! Book an appointment

use super::args;
use super::{Tool, ToolContext, ToolOutput};
use crate::clinic::NewAppointment;
use crate::schedule::resolve_hint;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct BookAppointmentTool;

#[derive(Debug, Deserialize)]
struct BookAppointmentInput {
    #[serde(default, deserialize_with = "args::optional_text")]
    user_id: Option<String>,
    #[serde(deserialize_with = "args::integer")]
    doctor_id: i64,
    #[serde(default)]
    doctor_name: Option<String>,
    appointment_date: String,
    patient_name: String,
    #[serde(deserialize_with = "args::integer")]
    patient_age: i64,
}

#[async_trait]
impl Tool for BookAppointmentTool {
    fn name(&self) -> &'static str {
        "doctor_appointment"
    }

    fn description(&self) -> String {
        "Book an appointment with a doctor. Only call this after the patient has confirmed every detail: doctor, date, patient name and patient age.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["doctor_id", "appointment_date", "patient_name", "patient_age"],
            "properties": {
                "user_id": {
                    "type": "string",
                    "description": "The user_id given at the start of the conversation"
                },
                "doctor_id": {
                    "type": "integer",
                    "description": "Doctor id from doctor_list"
                },
                "doctor_name": {
                    "type": "string",
                    "description": "Doctor name, for confirmation"
                },
                "appointment_date": {
                    "type": "string",
                    "description": "Appointment date, e.g. '2026-03-09' or 'Mon, March 09, 2026'"
                },
                "patient_name": {
                    "type": "string",
                    "description": "Full name of the patient"
                },
                "patient_age": {
                    "type": "integer",
                    "description": "Age of the patient in years"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: BookAppointmentInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("Invalid input: {e}")),
        };

        let Some(date) = resolve_hint(&input.appointment_date, ctx.today) else {
            return ToolOutput::error(format!(
                "Invalid date format '{}'. Please use YYYY-MM-DD",
                input.appointment_date
            ));
        };

        let request = NewAppointment {
            user_id: ctx.user_id(input.user_id.as_deref()),
            doctor_id: input.doctor_id,
            patient_name: input.patient_name,
            patient_age: input.patient_age,
            date,
        };

        match ctx.clinic().book_appointment(request).await {
            Ok(confirmation) => {
                if let Some(named) = input
                    .doctor_name
                    .as_deref()
                    .filter(|n| !n.eq_ignore_ascii_case(&confirmation.doctor_name))
                {
                    tracing::warn!(
                        doctor_id = input.doctor_id,
                        named = %named,
                        booked = %confirmation.doctor_name,
                        "Doctor name in booking request differs from doctor_id"
                    );
                }
                ToolOutput::json(&confirmation)
            }
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}
