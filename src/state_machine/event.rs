//! Events that drive one dispatch loop run

use crate::llm::ModelTurn;
use crate::session::OperationResult;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// The model gateway answered
    ModelTurn(ModelTurn),

    /// The operation currently executing finished (successfully or not)
    OperationComplete(OperationResult),
}
