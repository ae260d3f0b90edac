//! Dispatch state definitions

use crate::session::{OperationRequest, OperationResult};

/// Default ceiling on model calls per turn
pub const DEFAULT_MAX_ROUNDS: u32 = 8;

/// Fixed reply when the round ceiling is hit before the model said anything usable
pub const ROUND_LIMIT_REPLY: &str =
    "I'm sorry, I wasn't able to finish that request. Could you rephrase or try again?";

/// Where one dispatch loop run stands
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchState {
    /// Waiting on the model gateway; `round` counts model calls this turn
    AwaitingModel {
        round: u32,
        /// Latest non-empty visible assistant text this turn
        draft: Option<String>,
    },

    /// Running a batch of operations, one at a time in request order
    AwaitingOperations {
        round: u32,
        current: OperationRequest,
        remaining: Vec<OperationRequest>,
        completed: Vec<OperationResult>,
        draft: Option<String>,
    },

    /// Terminal
    Done { text: String },
}

impl DispatchState {
    /// The state a turn starts in, before the first model call
    pub fn initial() -> Self {
        DispatchState::AwaitingModel {
            round: 1,
            draft: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Done { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            DispatchState::AwaitingModel { .. } => "awaiting_model",
            DispatchState::AwaitingOperations { .. } => "awaiting_operations",
            DispatchState::Done { .. } => "done",
        }
    }
}

/// Fixed parameters of one dispatch loop run
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub thread_id: String,
    /// Model calls allowed before a forced answer
    pub max_rounds: u32,
}

impl DispatchContext {
    pub fn new(thread_id: impl Into<String>, max_rounds: u32) -> Self {
        Self {
            thread_id: thread_id.into(),
            max_rounds: max_rounds.max(1),
        }
    }
}
