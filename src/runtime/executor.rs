//! Dispatch loop executor
//!
//! Drives the pure transition function for one user turn, performing the
//! effects it asks for: model calls, operation calls, and history writes.

use super::traits::{LlmClient, ToolExecutor};
use super::TurnError;

use crate::llm::LlmRequest;
use crate::session::history::{repair, trim};
use crate::session::{Message, OperationRequest, OperationResult, SessionStore};
use crate::state_machine::{
    transition, DispatchContext, DispatchState, Effect, Event, TransitionError,
};
use crate::system_prompt::build_system_prompt;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Per-turn knobs that don't belong to the pure state machine
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub today: NaiveDate,
    pub max_messages: usize,
    pub max_tokens: Option<u32>,
}

/// One run of the dispatch loop over a thread's history
pub struct DispatchLoop<L, T>
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    context: DispatchContext,
    state: DispatchState,
    history: Vec<Message>,
    settings: TurnSettings,
    llm_client: Arc<L>,
    tool_executor: Arc<T>,
    store: Arc<SessionStore>,
    reply: Option<String>,
}

impl<L, T> DispatchLoop<L, T>
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    pub fn new(
        context: DispatchContext,
        history: Vec<Message>,
        settings: TurnSettings,
        llm_client: Arc<L>,
        tool_executor: Arc<T>,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            context,
            state: DispatchState::initial(),
            history,
            settings,
            llm_client,
            tool_executor,
            store,
            reply: None,
        }
    }

    /// Run until the model gives a final answer or the round ceiling forces one
    pub async fn run(mut self) -> Result<String, TurnError> {
        let started = Instant::now();
        let mut events_to_process = VecDeque::new();

        if let Some(event) = self.execute_effect(Effect::RequestModel).await? {
            events_to_process.push_back(event);
        }

        while let Some(event) = events_to_process.pop_front() {
            let result = transition(&self.state, &self.context, event)?;
            tracing::debug!(
                thread_id = %self.context.thread_id,
                from = self.state.name(),
                to = result.new_state.name(),
                "Dispatch transition"
            );
            self.state = result.new_state;

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(effect).await? {
                    events_to_process.push_back(generated);
                }
            }
        }

        let reply = match self.reply.take() {
            Some(reply) if self.state.is_terminal() => reply,
            _ => {
                return Err(TurnError::Internal(TransitionError::InvalidTransition(
                    format!("loop stopped in {} without an answer", self.state.name()),
                )))
            }
        };

        tracing::info!(
            thread_id = %self.context.thread_id,
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Turn complete"
        );
        Ok(reply)
    }

    async fn execute_effect(&mut self, effect: Effect) -> Result<Option<Event>, TurnError> {
        match effect {
            Effect::AppendMessage(message) => {
                self.history.push(message);
                Ok(None)
            }

            Effect::RequestModel => {
                let round = match &self.state {
                    DispatchState::AwaitingModel { round, .. } => *round,
                    _ => 0,
                };
                let request = self.build_request();
                tracing::info!(
                    thread_id = %self.context.thread_id,
                    round,
                    model = %self.llm_client.model_id(),
                    messages = request.messages.len(),
                    "Requesting model"
                );

                let response = self.llm_client.complete(&request).await.map_err(|e| {
                    tracing::error!(
                        thread_id = %self.context.thread_id,
                        round,
                        kind = ?e.kind,
                        error = %e,
                        "Model gateway failed"
                    );
                    TurnError::Gateway(e)
                })?;
                Ok(Some(Event::ModelTurn(response.into_turn())))
            }

            Effect::ExecuteOperation(request) => {
                let result = self.execute_operation(request).await;
                Ok(Some(Event::OperationComplete(result)))
            }

            // The working history stays whole until the turn ends; only the
            // stored copy is bounded
            Effect::PersistHistory => {
                let stored = trim(self.history.clone(), self.settings.max_messages);
                self.store.persist(&self.context.thread_id, stored);
                Ok(None)
            }

            Effect::Finish { text } => {
                self.reply = Some(text);
                Ok(None)
            }
        }
    }

    fn build_request(&self) -> LlmRequest {
        let anchor = self
            .history
            .first()
            .map(Message::visible_text)
            .unwrap_or_default();
        LlmRequest {
            system: build_system_prompt(&anchor, self.settings.today),
            messages: repair(&self.history),
            tools: self.tool_executor.definitions(),
            max_tokens: self.settings.max_tokens,
        }
    }

    /// Run one operation in its own task so a panic surfaces as an error result
    async fn execute_operation(&self, request: OperationRequest) -> OperationResult {
        let tool_executor = self.tool_executor.clone();
        let thread_id = self.context.thread_id.clone();
        let today = self.settings.today;
        let name = request.name.clone();
        let input = request.arguments.clone();
        let started = Instant::now();

        tracing::info!(
            thread_id = %thread_id,
            operation = %name,
            id = %request.id,
            "Executing operation"
        );

        let handle = tokio::spawn(async move {
            tool_executor.execute(&thread_id, today, &name, input).await
        });

        let result = match handle.await {
            Ok(Some(output)) => output.into_result(&request.id),
            Ok(None) => {
                OperationResult::error(&request.id, format!("Unknown operation '{}'", request.name))
            }
            Err(e) => {
                tracing::error!(
                    thread_id = %self.context.thread_id,
                    operation = %request.name,
                    error = %e,
                    "Operation task failed"
                );
                OperationResult::error(
                    &request.id,
                    format!("Operation '{}' failed unexpectedly", request.name),
                )
            }
        };

        tracing::info!(
            thread_id = %self.context.thread_id,
            operation = %request.name,
            success = !result.is_error(),
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Operation complete"
        );
        result
    }
}
