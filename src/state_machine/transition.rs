//! Pure state transition function

use super::state::ROUND_LIMIT_REPLY;
use super::{DispatchContext, DispatchState, Effect, Event};
use crate::llm::ModelTurn;
use crate::session::{Content, Message, OperationRequest};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DispatchState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DispatchState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("Turn already finished")]
    AlreadyDone,
    #[error("Result for '{got}' while waiting on '{expected}'")]
    UnexpectedResult { expected: String, got: String },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs this always produces the same outputs, with no I/O.
pub fn transition(
    state: &DispatchState,
    context: &DispatchContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        (DispatchState::Done { .. }, _) => Err(TransitionError::AlreadyDone),

        // Model answered with no requests: the turn is over
        (
            DispatchState::AwaitingModel { .. },
            Event::ModelTurn(ModelTurn::FinalAnswer { content }),
        ) => Ok(finish(content)),

        // Defensive shape: a batch with nothing in it is a final answer
        (
            DispatchState::AwaitingModel { .. },
            Event::ModelTurn(ModelTurn::OperationBatch { content, requests }),
        ) if requests.is_empty() => Ok(finish(content)),

        (
            DispatchState::AwaitingModel { round, draft },
            Event::ModelTurn(ModelTurn::OperationBatch { content, requests }),
        ) => {
            let draft = non_empty(content.visible_text()).or_else(|| draft.clone());
            let message = Message::assistant(content, requests.clone());
            let mut pending = requests.into_iter();
            let Some(current) = pending.next() else {
                return Err(TransitionError::InvalidTransition(
                    "operation batch without requests".to_string(),
                ));
            };
            Ok(TransitionResult::new(DispatchState::AwaitingOperations {
                round: *round,
                current: current.clone(),
                remaining: pending.collect(),
                completed: vec![],
                draft,
            })
            .with_effect(Effect::append(message))
            .with_effect(Effect::execute(current)))
        }

        (
            DispatchState::AwaitingOperations {
                round,
                current,
                remaining,
                completed,
                draft,
            },
            Event::OperationComplete(result),
        ) => {
            if result.request_id != current.id {
                return Err(TransitionError::UnexpectedResult {
                    expected: current.id.clone(),
                    got: result.request_id,
                });
            }

            let mut completed = completed.clone();
            completed.push(result);

            if let Some((next, rest)) = remaining.split_first() {
                return Ok(TransitionResult::new(DispatchState::AwaitingOperations {
                    round: *round,
                    current: next.clone(),
                    remaining: rest.to_vec(),
                    completed,
                    draft: draft.clone(),
                })
                .with_effect(Effect::execute(next.clone())));
            }

            // Batch complete: every request now has its result
            let appended = completed
                .into_iter()
                .map(|r| Effect::append(Message::OperationResult(r)));
            let result = TransitionResult::new(DispatchState::AwaitingModel {
                round: round + 1,
                draft: draft.clone(),
            })
            .with_effects(appended)
            .with_effect(Effect::PersistHistory);

            if *round >= context.max_rounds {
                let text = draft
                    .clone()
                    .unwrap_or_else(|| ROUND_LIMIT_REPLY.to_string());
                tracing::warn!(
                    thread_id = %context.thread_id,
                    rounds = *round,
                    "Round limit reached, forcing an answer"
                );
                let forced = finish(Content::text(text));
                return Ok(TransitionResult::new(forced.new_state)
                    .with_effects(result.effects)
                    .with_effects(forced.effects));
            }

            Ok(result.with_effect(Effect::RequestModel))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} cannot handle {}",
            state.name(),
            event_name(&event)
        ))),
    }
}

fn finish(content: Content) -> TransitionResult {
    let text = content.visible_text();
    TransitionResult::new(DispatchState::Done { text: text.clone() })
        .with_effect(Effect::append(Message::assistant(content, Vec::<OperationRequest>::new())))
        .with_effect(Effect::PersistHistory)
        .with_effect(Effect::finish(text))
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::ModelTurn(_) => "model_turn",
        Event::OperationComplete(_) => "operation_complete",
    }
}
