//! Effects produced by state transitions

use crate::session::{Message, OperationRequest};

/// Effects to be executed after a transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message to the working history
    AppendMessage(Message),

    /// Call the model gateway with the working history
    RequestModel,

    /// Run one operation and report back with `Event::OperationComplete`
    ExecuteOperation(OperationRequest),

    /// Write the working history back to the session store
    PersistHistory,

    /// The turn is over; `text` goes back to the caller
    Finish { text: String },
}

impl Effect {
    pub fn append(message: Message) -> Self {
        Effect::AppendMessage(message)
    }

    pub fn execute(request: OperationRequest) -> Self {
        Effect::ExecuteOperation(request)
    }

    pub fn finish(text: impl Into<String>) -> Self {
        Effect::Finish { text: text.into() }
    }
}
