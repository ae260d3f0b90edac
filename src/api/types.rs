//! API request and response types

use crate::llm::ToolDefinition;
use serde::{Deserialize, Serialize};

/// Request body for a user turn
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_input: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// The assistant's reply to a user turn
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Response for clearing a thread
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    /// Whether the thread had any state to clear
    pub existed: bool,
}

/// Operations the model can call
#[derive(Debug, Serialize)]
pub struct OperationsResponse {
    pub operations: Vec<ToolDefinition>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
