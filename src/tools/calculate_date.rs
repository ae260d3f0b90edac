//! Turn a date hint ("next Monday", "3 days from now") into a concrete date
//!
//! The rule-based resolver handles the common shapes. Anything else goes to a
//! cheap model with a short deadline, constrained to the doctor's days.

use super::{Tool, ToolContext, ToolOutput};
use crate::llm::{LlmRequest, LlmService};
use crate::schedule::{format_date, parse_appointment_date, resolve_hint, AvailabilityPattern};
use crate::session::Message;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

const FALLBACK_PROMPT: &str = "You are a date calculation assistant. Given a doctor's availability schedule and a patient's date request, find the next date that satisfies both.

Rules:
- Only suggest dates when the doctor is available
- Consider the current date and find dates in the current or next year
- Return ONLY the date in format: YYYY-MM-DD
- No explanations, just the date";

pub struct CalculateDateTool;

#[derive(Debug, Deserialize)]
struct CalculateDateInput {
    date_info: String,
    #[serde(default)]
    doctor_availability: Option<String>,
}

#[async_trait]
impl Tool for CalculateDateTool {
    fn name(&self) -> &'static str {
        "calculate_date"
    }

    fn description(&self) -> String {
        "Convert the patient's date wording (e.g. 'next Monday', 'tomorrow', 'end of next week', '3 days from now') into a concrete appointment date. Pass the doctor's availability so the result can be checked against their working days.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["date_info"],
            "properties": {
                "date_info": {
                    "type": "string",
                    "description": "The patient's description of the date"
                },
                "doctor_availability": {
                    "type": "string",
                    "description": "The doctor's availability, e.g. 'Mon-Fri 9AM-5PM'"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: CalculateDateInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("Invalid input: {e}")),
        };

        let pattern = input
            .doctor_availability
            .as_deref()
            .and_then(|raw| AvailabilityPattern::parse(raw).ok());

        let date = match resolve_hint(&input.date_info, ctx.today) {
            Some(date) => date,
            None => {
                let Some(llm) = ctx.llm_registry().get_cheap_model() else {
                    return ToolOutput::error(format!("Could not understand date '{}'", input.date_info));
                };
                match ask_model(llm, &input, ctx.today).await {
                    Some(date) => date,
                    None => {
                        return ToolOutput::error(format!(
                            "Could not understand date '{}'",
                            input.date_info
                        ))
                    }
                }
            }
        };

        ToolOutput::success(describe(date, pattern.as_ref()))
    }
}

fn describe(date: NaiveDate, pattern: Option<&AvailabilityPattern>) -> String {
    let mut text = format!("appointment_date: {}", format_date(date));
    if let Some(pattern) = pattern.filter(|p| !p.contains(date)) {
        text.push_str(&format!(" (doctor is not available that day; availability is {pattern}"));
        if let Some(next) = pattern.next_available(date) {
            text.push_str(&format!(", next available: {}", format_date(next)));
        }
        text.push(')');
    }
    text
}

async fn ask_model(
    llm: Arc<dyn LlmService>,
    input: &CalculateDateInput,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let prompt = format!(
        "Current date: {today}\nDoctor's available days: {}\nUser's date preference: {}\n\nFind the next available date:",
        input.doctor_availability.as_deref().unwrap_or("any day"),
        input.date_info
    );
    let request = LlmRequest {
        system: FALLBACK_PROMPT.to_string(),
        messages: vec![Message::user(prompt)],
        tools: vec![],
        max_tokens: Some(20),
    };

    match timeout(FALLBACK_TIMEOUT, llm.complete(&request)).await {
        Ok(Ok(response)) => {
            let text = response.content.visible_text();
            let parsed = parse_appointment_date(text.trim()).ok();
            if parsed.is_none() {
                tracing::warn!(response = %text, "Date fallback returned an unparseable date");
            }
            parsed
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e.message, "Date fallback LLM error");
            None
        }
        Err(_) => {
            tracing::warn!("Date fallback timed out");
            None
        }
    }
}
