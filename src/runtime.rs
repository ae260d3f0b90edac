//! Runtime for executing user turns
//!
//! Every thread id gets one worker task fed by an mpsc queue, so turns for the
//! same thread run one at a time while different threads proceed in parallel.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{DispatchLoop, TurnSettings};
pub use traits::*;

use crate::clinic::ClinicBackend;
use crate::llm::{LlmError, ModelRegistry, ToolDefinition};
use crate::session::history::trim;
use crate::session::{Message, SessionStore, INACTIVITY_TIMEOUT_MINUTES, MAX_MESSAGES};
use crate::state_machine::state::DEFAULT_MAX_ROUNDS;
use crate::state_machine::{DispatchContext, TransitionError};
use crate::tools::ToolRegistry;
use chrono::{DateTime, Duration, Local, Utc};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};

/// Type alias for the production assistant with concrete implementations
pub type ProductionAssistant = Assistant<RegistryLlmClient, ToolRegistryExecutor>;

/// Thread id used when a caller doesn't name one
pub const DEFAULT_THREAD_ID: &str = "1";

/// Why a user turn could not produce a reply
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Model gateway error: {0}")]
    Gateway(#[from] LlmError),
    #[error("Internal dispatch error: {0}")]
    Internal(#[from] TransitionError),
    #[error("Thread worker stopped before replying")]
    WorkerGone,
}

/// Assistant tuning, read once at startup
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub max_messages: usize,
    pub max_rounds: u32,
    pub inactivity_timeout: Duration,
    pub default_thread: String,
    pub max_tokens: Option<u32>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_messages: MAX_MESSAGES,
            max_rounds: DEFAULT_MAX_ROUNDS,
            inactivity_timeout: Duration::minutes(INACTIVITY_TIMEOUT_MINUTES),
            default_thread: DEFAULT_THREAD_ID.to_string(),
            max_tokens: Some(1024),
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let default_thread = std::env::var("CONCIERGE_DEFAULT_THREAD")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.default_thread);
        Self {
            max_messages: env_number("CONCIERGE_MAX_MESSAGES", defaults.max_messages).max(2),
            max_rounds: env_number("CONCIERGE_MAX_ROUNDS", defaults.max_rounds).max(1),
            inactivity_timeout: Duration::minutes(env_number(
                "CONCIERGE_INACTIVITY_MINUTES",
                INACTIVITY_TIMEOUT_MINUTES,
            )),
            default_thread,
            max_tokens: defaults.max_tokens,
        }
    }
}

fn env_number<N: FromStr + Copy + std::fmt::Display>(key: &str, default: N) -> N {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Invalid number, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Work queued for a thread's worker, applied strictly in arrival order
enum WorkerCommand {
    Turn {
        text: String,
        received_at: DateTime<Utc>,
        reply: oneshot::Sender<Result<String, TurnError>>,
    },
    Clear {
        reply: oneshot::Sender<bool>,
    },
    Evict {
        cutoff: DateTime<Utc>,
        reply: oneshot::Sender<bool>,
    },
}

/// State shared by the assistant and its workers
struct Shared<L, T> {
    store: Arc<SessionStore>,
    llm_client: Arc<L>,
    tool_executor: Arc<T>,
    config: AssistantConfig,
}

/// Entry point for "submit user turn"
pub struct Assistant<L, T>
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    shared: Arc<Shared<L, T>>,
    workers: RwLock<HashMap<String, mpsc::Sender<WorkerCommand>>>,
}

impl ProductionAssistant {
    /// Wire the assistant to the model registry and appointment backend
    pub fn production(
        config: AssistantConfig,
        llm_registry: Arc<ModelRegistry>,
        clinic: Arc<dyn ClinicBackend>,
    ) -> Self {
        let llm_client = RegistryLlmClient::new(llm_registry.clone());
        let tool_executor =
            ToolRegistryExecutor::new(ToolRegistry::standard(), clinic, llm_registry);
        Self::new(config, llm_client, tool_executor)
    }
}

impl<L, T> Assistant<L, T>
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    pub fn new(config: AssistantConfig, llm_client: L, tool_executor: T) -> Self {
        let store = Arc::new(SessionStore::new(config.inactivity_timeout));
        Self {
            shared: Arc::new(Shared {
                store,
                llm_client: Arc::new(llm_client),
                tool_executor: Arc::new(tool_executor),
                config,
            }),
            workers: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.shared.store
    }

    /// Operations advertised to the model
    pub fn operations(&self) -> Vec<ToolDefinition> {
        self.shared.tool_executor.definitions()
    }

    /// Submit a user turn and wait for the final reply
    pub async fn submit_turn(&self, thread_id: Option<&str>, text: &str) -> Result<String, TurnError> {
        self.submit_turn_at(thread_id, text, Utc::now()).await
    }

    /// Submit a user turn stamped with an explicit arrival time
    pub async fn submit_turn_at(
        &self,
        thread_id: Option<&str>,
        text: &str,
        received_at: DateTime<Utc>,
    ) -> Result<String, TurnError> {
        let thread_id = thread_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(self.shared.config.default_thread.as_str())
            .to_string();

        let (reply_tx, reply_rx) = oneshot::channel();
        let request = WorkerCommand::Turn {
            text: text.to_string(),
            received_at,
            reply: reply_tx,
        };

        // A worker that died (panicked mid-turn) is replaced once
        let sender = self.worker(&thread_id).await;
        if let Err(mpsc::error::SendError(request)) = sender.send(request).await {
            tracing::warn!(thread_id = %thread_id, "Thread worker gone, restarting");
            self.workers.write().await.remove(&thread_id);
            let sender = self.worker(&thread_id).await;
            sender
                .send(request)
                .await
                .map_err(|_| TurnError::WorkerGone)?;
        }

        reply_rx.await.map_err(|_| TurnError::WorkerGone)?
    }

    /// Forget a thread's history; the next turn starts anchored and empty.
    ///
    /// A turn already queued or running for the thread finishes first.
    pub async fn clear_thread(&self, thread_id: &str) -> bool {
        let sender = {
            let workers = self.workers.write().await;
            match workers.get(thread_id).filter(|s| !s.is_closed()).cloned() {
                Some(sender) => sender,
                // No worker and the map is locked, so no turn can be writing
                None => return self.shared.store.clear(thread_id),
            }
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        match sender.send(WorkerCommand::Clear { reply: reply_tx }).await {
            Ok(()) => reply_rx.await.unwrap_or(false),
            Err(_) => self.shared.store.clear(thread_id),
        }
    }

    /// Drop threads idle since before `cutoff`, along with their idle workers
    pub async fn evict_idle(&self, cutoff: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        for thread_id in self.shared.store.idle_threads(cutoff) {
            if self.evict_thread(&thread_id, cutoff).await {
                evicted += 1;
            }
        }
        if evicted > 0 {
            tracing::info!(count = evicted, "Evicted idle threads");
        }
        evicted
    }

    async fn evict_thread(&self, thread_id: &str, cutoff: DateTime<Utc>) -> bool {
        let sender = {
            let mut workers = self.workers.write().await;
            match workers.get(thread_id).filter(|s| !s.is_closed()).cloned() {
                Some(sender) => sender,
                None => {
                    workers.remove(thread_id);
                    return self.shared.store.evict_if_idle(thread_id, cutoff);
                }
            }
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let evicted = match sender.send(WorkerCommand::Evict { cutoff, reply: reply_tx }).await {
            Ok(()) => reply_rx.await.unwrap_or(false),
            Err(_) => self.shared.store.evict_if_idle(thread_id, cutoff),
        };
        drop(sender);

        if evicted {
            // Retire the worker only if nothing is queued and no submitter holds its queue
            let mut workers = self.workers.write().await;
            let idle = workers.get(thread_id).is_some_and(|s| {
                s.strong_count() == 1 && s.capacity() == s.max_capacity()
            });
            if idle {
                workers.remove(thread_id);
            }
        }
        evicted
    }

    /// Get the worker queue for a thread, starting the worker if needed
    async fn worker(&self, thread_id: &str) -> mpsc::Sender<WorkerCommand> {
        {
            let workers = self.workers.read().await;
            if let Some(sender) = workers.get(thread_id) {
                if !sender.is_closed() {
                    return sender.clone();
                }
            }
        }

        let mut workers = self.workers.write().await;
        if let Some(sender) = workers.get(thread_id) {
            if !sender.is_closed() {
                return sender.clone();
            }
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(run_worker(self.shared.clone(), thread_id.to_string(), rx));
        workers.insert(thread_id.to_string(), tx.clone());
        tx
    }
}

async fn run_worker<L, T>(
    shared: Arc<Shared<L, T>>,
    thread_id: String,
    mut rx: mpsc::Receiver<WorkerCommand>,
) where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    tracing::debug!(thread_id = %thread_id, "Thread worker started");
    while let Some(command) = rx.recv().await {
        match command {
            WorkerCommand::Turn {
                text,
                received_at,
                reply,
            } => {
                let result = shared.handle_turn(&thread_id, text, received_at).await;
                if let Err(e) = &result {
                    tracing::error!(thread_id = %thread_id, error = %e, "Turn failed");
                }
                let _ = reply.send(result);
            }
            WorkerCommand::Clear { reply } => {
                let _ = reply.send(shared.store.clear(&thread_id));
            }
            WorkerCommand::Evict { cutoff, reply } => {
                let _ = reply.send(shared.store.evict_if_idle(&thread_id, cutoff));
            }
        }
    }
    tracing::debug!(thread_id = %thread_id, "Thread worker stopped");
}

impl<L, T> Shared<L, T>
where
    L: LlmClient + 'static,
    T: ToolExecutor + 'static,
{
    async fn handle_turn(
        &self,
        thread_id: &str,
        text: String,
        received_at: DateTime<Utc>,
    ) -> Result<String, TurnError> {
        let thread = if self.store.should_reset(thread_id, received_at) {
            self.store.reset(thread_id)
        } else {
            self.store.get(thread_id)
        };
        self.store.touch(thread_id, received_at);

        // The user message is durable before the model is asked anything
        let mut history = thread.messages;
        history.push(Message::user(text));
        let history = trim(history, self.config.max_messages);
        self.store.persist(thread_id, history.clone());

        let settings = TurnSettings {
            today: received_at.with_timezone(&Local).date_naive(),
            max_messages: self.config.max_messages,
            max_tokens: self.config.max_tokens,
        };
        DispatchLoop::new(
            DispatchContext::new(thread_id, self.config.max_rounds),
            history,
            settings,
            self.llm_client.clone(),
            self.tool_executor.clone(),
            self.store.clone(),
        )
        .run()
        .await
    }
}
