//! List every doctor with skills and availability

use super::{Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct DoctorListTool;

#[async_trait]
impl Tool for DoctorListTool {
    fn name(&self) -> &'static str {
        "doctor_list"
    }

    fn description(&self) -> String {
        "List all doctors with their id, name, skills and weekly availability (e.g. 'Mon-Fri 9AM-5PM'). Use it to find the doctor_id for a booking and to learn which days a doctor works.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn run(&self, _input: Value, ctx: ToolContext) -> ToolOutput {
        match ctx.clinic().list_doctors().await {
            Ok(doctors) => ToolOutput::json(&doctors),
            Err(e) => ToolOutput::error(e.to_string()),
        }
    }
}
