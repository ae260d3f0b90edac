//! History policy: bound and repair a thread's message sequence

use super::message::Message;
use std::collections::HashSet;

/// Default bound on stored messages per thread
pub const MAX_MESSAGES: usize = 20;

/// Bound a history to `max` messages.
///
/// When over the bound the result is the anchor followed by the most recent
/// `max - 1` messages. Interior turns are dropped silently; a cut may land
/// between an operation request and its result (see [`repair`]).
pub fn trim(messages: Vec<Message>, max: usize) -> Vec<Message> {
    if messages.len() <= max || max == 0 {
        return messages;
    }

    let keep_tail = max - 1;
    let tail_start = messages.len() - keep_tail;
    let mut iter = messages.into_iter();
    let mut trimmed = Vec::with_capacity(max);
    if let Some(anchor) = iter.next() {
        trimmed.push(anchor);
    }
    trimmed.extend(iter.skip(tail_start - 1));
    trimmed
}

/// Build the model-facing view of a history.
///
/// Drops operation results whose request fell outside the window, and strips
/// requests from assistant messages that never received a result. Stored
/// history is left untouched; this only shapes what the gateway sees.
pub fn repair(messages: &[Message]) -> Vec<Message> {
    let answered: HashSet<&str> = messages
        .iter()
        .filter_map(|m| match m {
            Message::OperationResult(result) => Some(result.request_id.as_str()),
            _ => None,
        })
        .collect();

    let mut requested: HashSet<&str> = HashSet::new();
    let mut repaired = Vec::with_capacity(messages.len());

    for message in messages {
        match message {
            Message::Assistant { content, requests } => {
                let kept: Vec<_> = requests
                    .iter()
                    .filter(|r| answered.contains(r.id.as_str()))
                    .cloned()
                    .collect();
                if kept.len() != requests.len() {
                    tracing::debug!(
                        dropped = requests.len() - kept.len(),
                        "Stripping unanswered operation requests from model view"
                    );
                }
                requested.extend(
                    requests
                        .iter()
                        .filter(|r| answered.contains(r.id.as_str()))
                        .map(|r| r.id.as_str()),
                );
                repaired.push(Message::assistant(content.clone(), kept));
            }
            Message::OperationResult(result) => {
                if requested.contains(result.request_id.as_str()) {
                    repaired.push(message.clone());
                } else {
                    tracing::debug!(
                        request_id = %result.request_id,
                        "Dropping orphaned operation result from model view"
                    );
                }
            }
            _ => repaired.push(message.clone()),
        }
    }

    repaired
}
