//! Conversation message types
//!
//! Every message that flows between the user, the model and the operation
//! registry is a [`Message`]. Assistant content may arrive either as plain
//! text or as a list of typed parts; [`Content::from_value`] is the single
//! place where raw model output is normalized.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single part of structured assistant content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text shown to the user
    Text { text: String },
    /// Model reasoning, never shown to the user
    Reasoning { text: String },
    /// Any part type we do not understand (kept for fidelity, never shown)
    Unknown { raw: Value },
}

/// Message content: plain text or an ordered list of typed parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Default for Content {
    fn default() -> Self {
        Content::Text(String::new())
    }
}

impl Content {
    pub fn text(s: impl Into<String>) -> Self {
        Content::Text(s.into())
    }

    /// Normalize raw model content.
    ///
    /// Strings become text. Arrays become parts: bare strings and `text`
    /// objects are visible, `thinking`/`reasoning` objects are reasoning, and
    /// anything else is kept as `Unknown`. Any other shape (null, numbers,
    /// objects) is coerced to empty text instead of failing the turn.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Content::Text(s),
            Value::Array(items) => Content::Parts(items.into_iter().map(part_from_value).collect()),
            Value::Null => Content::default(),
            other => {
                tracing::warn!(content = %other, "Unrecognized model content shape, using empty text");
                Content::default()
            }
        }
    }

    /// Visible text: plain text as-is, or visible parts joined by a space
    pub fn visible_text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn part_from_value(value: Value) -> ContentPart {
    match value {
        Value::String(text) => ContentPart::Text { text },
        Value::Object(map) => {
            let text = map
                .get("text")
                .or_else(|| map.get("thinking"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let kind = map.get("type").and_then(Value::as_str).map(str::to_owned);
            match kind.as_deref() {
                Some("text") => ContentPart::Text { text },
                Some("thinking" | "reasoning") => ContentPart::Reasoning { text },
                _ => ContentPart::Unknown {
                    raw: Value::Object(map),
                },
            }
        }
        raw => ContentPart::Unknown { raw },
    }
}

/// A request from the model to run a named operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Correlation id pairing this request with its result
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl OperationRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// What an operation produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success { payload: Value },
    Error { message: String },
}

/// The answer to exactly one [`OperationRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub request_id: String,
    pub outcome: Outcome,
}

impl OperationResult {
    pub fn success(request_id: impl Into<String>, payload: Value) -> Self {
        Self {
            request_id: request_id.into(),
            outcome: Outcome::Success { payload },
        }
    }

    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            outcome: Outcome::Error {
                message: message.into(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error { .. })
    }

    /// Text handed to the model for this result
    pub fn render(&self) -> String {
        match &self.outcome {
            Outcome::Success { payload: Value::String(s) } => s.clone(),
            Outcome::Success { payload } => payload.to_string(),
            Outcome::Error { message } => format!("Error: {message}"),
        }
    }
}

/// A single conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: Content,
    },
    User {
        content: Content,
    },
    Assistant {
        content: Content,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        requests: Vec<OperationRequest>,
    },
    OperationResult(OperationResult),
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Message::User {
            content: Content::text(text),
        }
    }

    pub fn assistant(content: Content, requests: Vec<OperationRequest>) -> Self {
        Message::Assistant { content, requests }
    }

    /// The first message of every thread, carrying its identity
    pub fn anchor(thread_id: &str) -> Self {
        Message::user(format!("user_id: {thread_id}"))
    }

    /// Visible text of this message (empty for operation results)
    pub fn visible_text(&self) -> String {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content, .. } => content.visible_text(),
            Message::OperationResult(_) => String::new(),
        }
    }

    /// Operation requests carried by an assistant message
    pub fn requests(&self) -> &[OperationRequest] {
        match self {
            Message::Assistant { requests, .. } => requests,
            _ => &[],
        }
    }
}
