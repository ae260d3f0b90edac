//! Property-based tests for the dispatch state machine
//!
//! A scripted model drives the pure transition function to completion and
//! the resulting effect stream is checked for the loop's invariants.

use super::state::ROUND_LIMIT_REPLY;
use super::*;
use crate::llm::ModelTurn;
use crate::session::{Content, Message, OperationRequest, OperationResult};
use proptest::prelude::*;
use serde_json::json;
use std::collections::{HashSet, VecDeque};

// ============================================================================
// Generators
// ============================================================================

/// One scripted model reply: visible text plus how many requests it carries
fn arb_reply() -> impl Strategy<Value = (String, usize)> {
    ("[a-zA-Z ]{0,20}", 0usize..4)
}

fn arb_script() -> impl Strategy<Value = Vec<(String, usize)>> {
    proptest::collection::vec(arb_reply(), 1..12)
}

// ============================================================================
// Driver
// ============================================================================

struct Run {
    effects: Vec<Effect>,
    model_calls: usize,
    final_state: DispatchState,
}

/// Drive a turn, answering model calls from `script` (final answer when it
/// runs out) and operations with a success, or an error for odd ids.
fn drive(script: &[(String, usize)], max_rounds: u32) -> Run {
    let context = DispatchContext::new("t1", max_rounds);
    let mut replies: VecDeque<_> = script.iter().cloned().collect();
    let mut state = DispatchState::initial();
    let mut effects = vec![];
    let mut pending: VecDeque<Event> = VecDeque::new();
    let mut next_id = 0usize;
    let mut model_calls = 0;

    let mut request_model = |model_calls: &mut usize, next_id: &mut usize| {
        *model_calls += 1;
        let (text, n) = replies.pop_front().unwrap_or_else(|| ("done".to_string(), 0));
        let requests: Vec<_> = (0..n)
            .map(|_| {
                *next_id += 1;
                OperationRequest::new(format!("r{next_id}"), "doctor_list", json!({}))
            })
            .collect();
        let turn = if requests.is_empty() {
            ModelTurn::FinalAnswer {
                content: Content::text(text),
            }
        } else {
            ModelTurn::OperationBatch {
                content: Content::text(text),
                requests,
            }
        };
        Event::ModelTurn(turn)
    };

    pending.push_back(request_model(&mut model_calls, &mut next_id));
    while let Some(event) = pending.pop_front() {
        let result = transition(&state, &context, event).expect("scripted run never misbehaves");
        state = result.new_state;
        for effect in result.effects {
            match &effect {
                Effect::RequestModel => {
                    pending.push_back(request_model(&mut model_calls, &mut next_id));
                }
                Effect::ExecuteOperation(request) => {
                    let n: usize = request.id.trim_start_matches('r').parse().unwrap();
                    let result = if n % 2 == 1 {
                        OperationResult::error(&request.id, "boom")
                    } else {
                        OperationResult::success(&request.id, json!({"ok": true}))
                    };
                    pending.push_back(Event::OperationComplete(result));
                }
                _ => {}
            }
            effects.push(effect);
        }
    }

    Run {
        effects,
        model_calls,
        final_state: state,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every turn ends in Done with exactly one Finish effect, last
    #[test]
    fn prop_always_terminates(script in arb_script(), max_rounds in 1u32..6) {
        let run = drive(&script, max_rounds);
        prop_assert!(run.final_state.is_terminal());
        let finishes = run.effects.iter().filter(|e| matches!(e, Effect::Finish { .. })).count();
        prop_assert_eq!(finishes, 1);
        let finished_last = matches!(run.effects.last(), Some(Effect::Finish { .. }));
        prop_assert!(finished_last, "last effect must be Finish");
    }

    /// Model calls never exceed the round ceiling
    #[test]
    fn prop_rounds_bounded(script in arb_script(), max_rounds in 1u32..6) {
        let run = drive(&script, max_rounds);
        prop_assert!(run.model_calls <= max_rounds as usize);
    }

    /// Every request appended is answered by exactly one result before the
    /// next model call, and results only answer requests already appended
    #[test]
    fn prop_request_result_pairing(script in arb_script(), max_rounds in 1u32..6) {
        let run = drive(&script, max_rounds);
        let mut open: HashSet<String> = HashSet::new();
        let mut answered: HashSet<String> = HashSet::new();
        for effect in &run.effects {
            match effect {
                Effect::AppendMessage(Message::Assistant { requests, .. }) => {
                    prop_assert!(open.is_empty());
                    open.extend(requests.iter().map(|r| r.id.clone()));
                }
                Effect::AppendMessage(Message::OperationResult(result)) => {
                    prop_assert!(open.remove(&result.request_id));
                    prop_assert!(answered.insert(result.request_id.clone()));
                }
                Effect::RequestModel | Effect::Finish { .. } => {
                    prop_assert!(open.is_empty());
                }
                _ => {}
            }
        }
    }

    /// Results are appended in request order
    #[test]
    fn prop_results_follow_request_order(script in arb_script()) {
        let run = drive(&script, 20);
        let mut expected: VecDeque<String> = VecDeque::new();
        for effect in &run.effects {
            match effect {
                Effect::AppendMessage(Message::Assistant { requests, .. }) => {
                    expected.extend(requests.iter().map(|r| r.id.clone()));
                }
                Effect::AppendMessage(Message::OperationResult(result)) => {
                    prop_assert_eq!(Some(&result.request_id), expected.front());
                    expected.pop_front();
                }
                _ => {}
            }
        }
    }

    /// A final answer's visible text is returned unchanged
    #[test]
    fn prop_final_text_unchanged(text in "[a-zA-Z?!. ]{0,40}") {
        let run = drive(&[(text.clone(), 0)], 3);
        prop_assert_eq!(run.final_state, DispatchState::Done { text: text.clone() });
        prop_assert_eq!(run.effects.last(), Some(&Effect::finish(text)));
    }

    /// A forced answer is never empty
    #[test]
    fn prop_forced_answer_non_empty(n in 1usize..4, max_rounds in 1u32..4) {
        let script: Vec<_> = (0..10).map(|_| (String::new(), n)).collect();
        let run = drive(&script, max_rounds);
        prop_assert_eq!(
            run.final_state,
            DispatchState::Done { text: ROUND_LIMIT_REPLY.to_string() }
        );
    }
}
