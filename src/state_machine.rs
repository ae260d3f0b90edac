//! Dispatch loop state machine
//!
//! Elm-style: a pure transition function maps (state, event) to a new state
//! plus effects. The runtime executes the effects and feeds results back.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{DispatchContext, DispatchState};
pub use transition::{transition, TransitionError};
