//! Common types for model gateway interactions

use crate::session::{Content, Message, OperationRequest};
use serde::Serialize;

/// A model gateway request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Fixed system instruction, sent ahead of the conversation
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: Option<u32>,
}

/// Operation definition advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A model gateway response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: Content,
    pub requests: Vec<OperationRequest>,
    pub usage: Usage,
}

impl LlmResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Content::text(text),
            requests: Vec::new(),
            usage: Usage::default(),
        }
    }

    /// Classify the response for the dispatch loop
    pub fn into_turn(self) -> ModelTurn {
        if self.requests.is_empty() {
            ModelTurn::FinalAnswer {
                content: self.content,
            }
        } else {
            ModelTurn::OperationBatch {
                content: self.content,
                requests: self.requests,
            }
        }
    }
}

/// What the model decided to do this round
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    /// No operation requests: the content is the answer
    FinalAnswer { content: Content },
    /// One or more operations to run before asking again
    OperationBatch {
        content: Content,
        requests: Vec<OperationRequest>,
    },
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
