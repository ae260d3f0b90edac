//! In-memory session store
//!
//! Maps a thread id to its message history and last-activity time. All
//! state is lost on restart. The store itself only guards its map; callers
//! that read-modify-write a thread must hold that thread's single writer
//! (see `runtime::Assistant`, which runs one worker per thread).

pub mod history;
pub mod message;

pub use history::MAX_MESSAGES;
pub use message::{Content, Message, OperationRequest, OperationResult};

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default inactivity window after which a thread starts over
pub const INACTIVITY_TIMEOUT_MINUTES: i64 = 30;

/// One conversation
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    /// `messages[0]` is always the anchor
    pub messages: Vec<Message>,
    /// `None` until the first turn touches the thread
    pub last_activity: Option<DateTime<Utc>>,
}

impl Thread {
    fn anchored(thread_id: &str) -> Self {
        Self {
            messages: vec![Message::anchor(thread_id)],
            last_activity: None,
        }
    }

    fn is_idle_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_activity.is_some_and(|last| last < cutoff)
    }
}

/// Keyed store of all threads
pub struct SessionStore {
    threads: Mutex<HashMap<String, Thread>>,
    inactivity_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::minutes(INACTIVITY_TIMEOUT_MINUTES))
    }
}

impl SessionStore {
    pub fn new(inactivity_timeout: Duration) -> Self {
        Self {
            threads: Mutex::new(HashMap::new()),
            inactivity_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Thread>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a thread, creating an anchored empty one if it has never been seen
    pub fn get(&self, thread_id: &str) -> Thread {
        self.lock()
            .entry(thread_id.to_string())
            .or_insert_with(|| {
                tracing::info!(thread_id = %thread_id, "Starting new thread");
                Thread::anchored(thread_id)
            })
            .clone()
    }

    /// True when a previously active thread has been idle longer than the timeout
    pub fn should_reset(&self, thread_id: &str, now: DateTime<Utc>) -> bool {
        self.lock()
            .get(thread_id)
            .and_then(|t| t.last_activity)
            .is_some_and(|last| now - last > self.inactivity_timeout)
    }

    /// Record activity. Older timestamps never move `last_activity` backwards.
    pub fn touch(&self, thread_id: &str, now: DateTime<Utc>) {
        let mut threads = self.lock();
        let thread = threads
            .entry(thread_id.to_string())
            .or_insert_with(|| Thread::anchored(thread_id));
        thread.last_activity = Some(match thread.last_activity {
            Some(last) if last > now => last,
            _ => now,
        });
    }

    /// Replace a thread's history
    pub fn persist(&self, thread_id: &str, messages: Vec<Message>) {
        let mut threads = self.lock();
        let thread = threads
            .entry(thread_id.to_string())
            .or_insert_with(|| Thread::anchored(thread_id));
        debug_assert!(
            messages.first() == thread.messages.first() || messages.is_empty(),
            "anchor must not change"
        );
        if messages.is_empty() {
            thread.messages = vec![Message::anchor(thread_id)];
        } else {
            thread.messages = messages;
        }
    }

    /// Logically restart a thread: history becomes the anchor alone
    pub fn reset(&self, thread_id: &str) -> Thread {
        let mut threads = self.lock();
        let thread = threads
            .entry(thread_id.to_string())
            .or_insert_with(|| Thread::anchored(thread_id));
        thread.messages = vec![Message::anchor(thread_id)];
        tracing::info!(thread_id = %thread_id, "Thread reset after inactivity");
        thread.clone()
    }

    /// Forget a thread entirely; its next turn starts a new one
    pub fn clear(&self, thread_id: &str) -> bool {
        let removed = self.lock().remove(thread_id).is_some();
        if removed {
            tracing::info!(thread_id = %thread_id, "Cleared thread state");
        }
        removed
    }

    /// Ids of threads whose last activity is before `cutoff`
    pub fn idle_threads(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(_, t)| t.is_idle_since(cutoff))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Drop a thread if it is still idle since before `cutoff`
    pub fn evict_if_idle(&self, thread_id: &str, cutoff: DateTime<Utc>) -> bool {
        let mut threads = self.lock();
        if !threads.get(thread_id).is_some_and(|t| t.is_idle_since(cutoff)) {
            return false;
        }
        threads.remove(thread_id);
        tracing::debug!(thread_id = %thread_id, "Evicted idle thread");
        true
    }

    pub fn thread_count(&self) -> usize {
        self.lock().len()
    }
}
