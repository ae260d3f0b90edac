//! Mock implementations for testing
//!
//! These mocks enable integration testing of whole turns without real I/O.

use super::traits::*;
use super::{Assistant, AssistantConfig};
use crate::llm::{LlmError, LlmRequest, LlmResponse, ToolDefinition, Usage};
use crate::session::{Content, OperationRequest};
use crate::tools::ToolOutput;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    delay: Option<Duration>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Model response carrying operation requests
pub fn batch(text: &str, requests: &[(&str, &str, Value)]) -> LlmResponse {
    LlmResponse {
        content: Content::text(text),
        requests: requests
            .iter()
            .map(|(id, name, args)| OperationRequest::new(*id, *name, args.clone()))
            .collect(),
        usage: Usage::default(),
    }
}

// ============================================================================
// Mock Tool Executor
// ============================================================================

/// Mock tool executor with predefined outputs
pub struct MockToolExecutor {
    outputs: HashMap<String, ToolOutput>,
    panicking: HashSet<String>,
    definitions: Vec<ToolDefinition>,
    /// Record of tool executions: (thread id, name, input)
    pub executions: Mutex<Vec<(String, String, Value)>>,
}

impl MockToolExecutor {
    pub fn new() -> Self {
        Self {
            outputs: HashMap::new(),
            panicking: HashSet::new(),
            definitions: Vec::new(),
            executions: Mutex::new(Vec::new()),
        }
    }

    fn define(&mut self, name: &str) {
        self.definitions.push(ToolDefinition {
            name: name.to_string(),
            description: format!("Mock {name}"),
            input_schema: serde_json::json!({ "type": "object", "properties": {} }),
        });
    }

    /// Add a tool with a predefined output
    pub fn with_tool(mut self, name: impl Into<String>, output: ToolOutput) -> Self {
        let name = name.into();
        self.define(&name);
        self.outputs.insert(name, output);
        self
    }

    /// Add a tool whose implementation panics
    pub fn with_panicking_tool(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.define(&name);
        self.panicking.insert(name);
        self
    }

    /// Get recorded executions
    pub fn recorded_executions(&self) -> Vec<(String, String, Value)> {
        self.executions.lock().unwrap().clone()
    }
}

impl Default for MockToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for MockToolExecutor {
    async fn execute(
        &self,
        thread_id: &str,
        _today: NaiveDate,
        name: &str,
        input: Value,
    ) -> Option<ToolOutput> {
        self.executions
            .lock()
            .unwrap()
            .push((thread_id.to_string(), name.to_string(), input));
        assert!(!self.panicking.contains(name), "mock tool '{name}' exploded");
        self.outputs.get(name).cloned()
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }
}

// ============================================================================
// Test Assistant Builder
// ============================================================================

/// Builder for an assistant wired to mocks
pub struct TestAssistantBuilder {
    config: AssistantConfig,
    llm: MockLlmClient,
    tools: MockToolExecutor,
}

impl TestAssistantBuilder {
    pub fn new() -> Self {
        Self {
            config: AssistantConfig::default(),
            llm: MockLlmClient::new("mock-model"),
            tools: MockToolExecutor::new(),
        }
    }

    pub fn max_rounds(mut self, max_rounds: u32) -> Self {
        self.config.max_rounds = max_rounds;
        self
    }

    pub fn max_messages(mut self, max_messages: usize) -> Self {
        self.config.max_messages = max_messages;
        self
    }

    pub fn llm(mut self, llm: MockLlmClient) -> Self {
        self.llm = llm;
        self
    }

    pub fn tools(mut self, tools: MockToolExecutor) -> Self {
        self.tools = tools;
        self
    }

    pub fn build(self) -> Assistant<MockLlmClient, MockToolExecutor> {
        Assistant::new(self.config, self.llm, self.tools)
    }
}

impl Default for TestAssistantBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: LlmClient + 'static, T: ToolExecutor + 'static> Assistant<L, T> {
    /// Borrow the mock LLM for queueing and inspection
    pub fn llm(&self) -> &L {
        &self.shared.llm_client
    }

    /// Borrow the mock tool executor for inspection
    pub fn tools(&self) -> &T {
        &self.shared.tool_executor
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinic::{ClinicBackend, SqliteClinic};
    use crate::llm::ModelRegistry;
    use crate::runtime::TurnError;
    use crate::session::{Message, OperationResult};
    use crate::state_machine::state::ROUND_LIMIT_REPLY;
    use crate::tools::ToolRegistry;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn last_result(request: &LlmRequest) -> OperationResult {
        match request.messages.last() {
            Some(Message::OperationResult(result)) => result.clone(),
            other => panic!("expected an operation result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_simple_text_response() {
        let assistant = TestAssistantBuilder::new().build();
        assistant
            .llm()
            .queue_response(LlmResponse::text("Which doctor would you like to see?"));

        let reply = assistant
            .submit_turn_at(Some("t1"), "I need an appointment", t0())
            .await
            .unwrap();
        assert_eq!(reply, "Which doctor would you like to see?");

        let requests = assistant.llm().recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].messages,
            vec![Message::anchor("t1"), Message::user("I need an appointment")]
        );
        assert!(requests[0].system.contains("user_id: t1"));

        let history = assistant.store().get("t1").messages;
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].visible_text(), "Which doctor would you like to see?");
    }

    #[tokio::test]
    async fn test_absent_thread_uses_default() {
        let assistant = TestAssistantBuilder::new().build();
        assistant.llm().queue_response(LlmResponse::text("hi"));

        assistant.submit_turn_at(None, "hello", t0()).await.unwrap();
        assert_eq!(
            assistant.store().get("1").messages[0],
            Message::anchor("1")
        );
    }

    #[tokio::test]
    async fn test_operation_cycle_pairs_results() {
        let tools = MockToolExecutor::new()
            .with_tool("doctor_list", ToolOutput::success(json!([{"id": 1}])))
            .with_tool("calculate_date", ToolOutput::success("appointment_date: 2026-03-09"));
        let assistant = TestAssistantBuilder::new().tools(tools).build();
        assistant.llm().queue_response(batch(
            "",
            &[
                ("a", "doctor_list", json!({})),
                ("b", "calculate_date", json!({"date_info": "next Monday"})),
            ],
        ));
        assistant.llm().queue_response(LlmResponse::text("Done"));

        let reply = assistant
            .submit_turn_at(Some("t1"), "book me", t0())
            .await
            .unwrap();
        assert_eq!(reply, "Done");

        // Executed in request order on behalf of the thread
        let executions = assistant.tools().recorded_executions();
        assert_eq!(executions.len(), 2);
        assert_eq!(executions[0].0, "t1");
        assert_eq!(executions[0].1, "doctor_list");
        assert_eq!(executions[1].1, "calculate_date");

        // Second model call sees both results, in order, after the request
        let requests = assistant.llm().recorded_requests();
        assert_eq!(requests.len(), 2);
        let messages = &requests[1].messages;
        assert_eq!(messages[2].requests().len(), 2);
        assert!(matches!(&messages[3], Message::OperationResult(r) if r.request_id == "a"));
        assert!(matches!(&messages[4], Message::OperationResult(r) if r.request_id == "b"));
    }

    #[tokio::test]
    async fn test_unknown_operation_becomes_error_result() {
        let assistant = TestAssistantBuilder::new().build();
        assistant
            .llm()
            .queue_response(batch("", &[("x", "teleport", json!({}))]));
        assistant
            .llm()
            .queue_response(LlmResponse::text("I can't do that."));

        let reply = assistant
            .submit_turn_at(Some("t1"), "beam me up", t0())
            .await
            .unwrap();
        assert_eq!(reply, "I can't do that.");

        let result = last_result(&assistant.llm().recorded_requests()[1]);
        assert!(result.is_error());
        assert_eq!(result.render(), "Error: Unknown operation 'teleport'");
    }

    #[tokio::test]
    async fn test_panicking_operation_keeps_loop_alive() {
        let tools = MockToolExecutor::new().with_panicking_tool("doctor_appointment");
        let assistant = TestAssistantBuilder::new().tools(tools).build();
        assistant.llm().queue_response(batch(
            "",
            &[("b1", "doctor_appointment", json!({"doctor_id": 1}))],
        ));
        assistant
            .llm()
            .queue_response(LlmResponse::text("Sorry, booking failed. Please try again."));

        let reply = assistant
            .submit_turn_at(Some("t1"), "yes, confirm", t0())
            .await
            .unwrap();
        assert_eq!(reply, "Sorry, booking failed. Please try again.");
        assert!(!reply.contains("exploded"));

        let result = last_result(&assistant.llm().recorded_requests()[1]);
        assert!(result.is_error());
        assert!(result.render().contains("failed unexpectedly"));
    }

    #[tokio::test]
    async fn test_gateway_error_keeps_user_message() {
        let assistant = TestAssistantBuilder::new().build();
        assistant
            .llm()
            .queue_error(LlmError::server_error("upstream down"));

        let err = assistant
            .submit_turn_at(Some("t1"), "hello", t0())
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::Gateway(_)));
        assert_eq!(
            assistant.store().get("t1").messages,
            vec![Message::anchor("t1"), Message::user("hello")]
        );

        // A retry resumes from the persisted user message
        assistant.llm().queue_response(LlmResponse::text("Hello!"));
        let reply = assistant
            .submit_turn_at(Some("t1"), "hello again", t0())
            .await
            .unwrap();
        assert_eq!(reply, "Hello!");
        let requests = assistant.llm().recorded_requests();
        assert_eq!(requests[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn test_gateway_error_after_batch_keeps_completed_results() {
        let tools = MockToolExecutor::new().with_tool("doctor_list", ToolOutput::success(json!([])));
        let assistant = TestAssistantBuilder::new().tools(tools).build();
        assistant
            .llm()
            .queue_response(batch("", &[("a", "doctor_list", json!({}))]));

        let err = assistant
            .submit_turn_at(Some("t1"), "who is available?", t0())
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::Gateway(_)));

        let history = assistant.store().get("t1").messages;
        assert_eq!(history.len(), 4);
        assert_eq!(history[2].requests().len(), 1);
        assert!(matches!(&history[3], Message::OperationResult(r) if r.request_id == "a"));
    }

    #[tokio::test]
    async fn test_round_limit_forces_answer() {
        let tools = MockToolExecutor::new().with_tool("doctor_list", ToolOutput::success(json!([])));
        let assistant = TestAssistantBuilder::new().tools(tools).max_rounds(2).build();
        for id in ["a", "b", "c"] {
            assistant
                .llm()
                .queue_response(batch("", &[(id, "doctor_list", json!({}))]));
        }

        let reply = assistant
            .submit_turn_at(Some("t1"), "loop forever", t0())
            .await
            .unwrap();
        assert_eq!(reply, ROUND_LIMIT_REPLY);
        assert_eq!(assistant.llm().recorded_requests().len(), 2);

        // Every request in history has its result; the forced answer is last
        let history = assistant.store().get("t1").messages;
        let requested: Vec<_> = history
            .iter()
            .flat_map(|m| m.requests().iter().map(|r| r.id.clone()))
            .collect();
        let answered: Vec<_> = history
            .iter()
            .filter_map(|m| match m {
                Message::OperationResult(r) => Some(r.request_id.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(requested, answered);
        assert_eq!(history.last().unwrap().visible_text(), ROUND_LIMIT_REPLY);
    }

    #[tokio::test]
    async fn test_anchor_survives_many_turns_and_trim() {
        let assistant = TestAssistantBuilder::new().max_messages(6).build();
        for i in 0..10 {
            assistant
                .llm()
                .queue_response(LlmResponse::text(format!("reply {i}")));
            assistant
                .submit_turn_at(Some("t1"), &format!("msg {i}"), t0())
                .await
                .unwrap();

            let history = assistant.store().get("t1").messages;
            assert_eq!(history[0], Message::anchor("t1"));
            assert!(history.len() <= 6);
        }

        let history = assistant.store().get("t1").messages;
        assert_eq!(history.last().unwrap().visible_text(), "reply 9");
        assert_eq!(history[history.len() - 2], Message::user("msg 9"));
    }

    #[tokio::test]
    async fn test_long_history_trimmed_before_model_call() {
        let assistant = TestAssistantBuilder::new().build();
        let mut seeded = vec![Message::anchor("t1")];
        for i in 0..24 {
            if i % 2 == 0 {
                seeded.push(Message::user(format!("u{i}")));
            } else {
                seeded.push(Message::assistant(Content::text(format!("a{i}")), vec![]));
            }
        }
        assert_eq!(seeded.len(), 25);
        assistant.store().persist("t1", seeded.clone());
        assistant.store().touch("t1", t0());
        assistant.llm().queue_response(LlmResponse::text("ok"));

        assistant
            .submit_turn_at(Some("t1"), "newest", t0())
            .await
            .unwrap();

        let sent = &assistant.llm().recorded_requests()[0].messages;
        assert_eq!(sent.len(), 20);
        assert_eq!(sent[0], seeded[0]);
        assert_eq!(sent[1..19], seeded[7..25]);
        assert_eq!(sent[19], Message::user("newest"));
    }

    #[tokio::test]
    async fn test_trim_never_hides_current_turn_from_model() {
        let tools = MockToolExecutor::new()
            .with_tool("doctor_list", ToolOutput::success(json!([{"id": 2}])))
            .with_tool("calculate_date", ToolOutput::success("appointment_date: 2026-03-09"));
        let assistant = TestAssistantBuilder::new()
            .tools(tools)
            .max_messages(6)
            .build();
        assistant.llm().queue_response(batch(
            "",
            &[
                ("a", "doctor_list", json!({})),
                ("b", "calculate_date", json!({"date_info": "Monday"})),
            ],
        ));
        assistant.llm().queue_response(batch(
            "",
            &[
                ("c", "doctor_list", json!({})),
                ("d", "calculate_date", json!({"date_info": "Tuesday"})),
            ],
        ));
        assistant
            .llm()
            .queue_response(LlmResponse::text("Dr. Khan is free on Monday."));

        let reply = assistant
            .submit_turn_at(Some("t1"), "Book me with Dr. Khan", t0())
            .await
            .unwrap();
        assert_eq!(reply, "Dr. Khan is free on Monday.");

        // Every model call in the turn sees the user's message and all results so far
        let requests = assistant.llm().recorded_requests();
        assert_eq!(requests.len(), 3);
        for (call, request) in requests.iter().enumerate() {
            assert!(
                request.messages.contains(&Message::user("Book me with Dr. Khan")),
                "call {call} lost the user message"
            );
        }
        let third = &requests[2].messages;
        assert_eq!(third.len(), 8);
        let answered: Vec<_> = third
            .iter()
            .filter_map(|m| match m {
                Message::OperationResult(r) => Some(r.request_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(answered, ["a", "b", "c", "d"]);

        // Only the stored copy is bounded
        let history = assistant.store().get("t1").messages;
        assert_eq!(history.len(), 6);
        assert_eq!(history[0], Message::anchor("t1"));
        assert_eq!(
            history.last().unwrap().visible_text(),
            "Dr. Khan is free on Monday."
        );
    }

    #[tokio::test]
    async fn test_reset_after_inactivity() {
        let assistant = TestAssistantBuilder::new().build();
        for text in ["first", "second", "third"] {
            assistant.llm().queue_response(LlmResponse::text(text));
        }

        assistant.submit_turn_at(Some("t1"), "one", t0()).await.unwrap();
        assistant
            .submit_turn_at(Some("t1"), "two", t0() + ChronoDuration::minutes(10))
            .await
            .unwrap();
        assistant
            .submit_turn_at(Some("t1"), "three", t0() + ChronoDuration::minutes(41))
            .await
            .unwrap();

        let requests = assistant.llm().recorded_requests();
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(
            requests[2].messages,
            vec![Message::anchor("t1"), Message::user("three")]
        );
    }

    #[tokio::test]
    async fn test_same_thread_turns_are_serialized() {
        let llm = MockLlmClient::new("mock-model").with_delay(Duration::from_millis(20));
        let assistant = TestAssistantBuilder::new().llm(llm).build();
        assistant.llm().queue_response(LlmResponse::text("r1"));
        assistant.llm().queue_response(LlmResponse::text("r2"));

        let (a, b) = tokio::join!(
            assistant.submit_turn_at(Some("t1"), "first", t0()),
            assistant.submit_turn_at(Some("t1"), "second", t0()),
        );
        a.unwrap();
        b.unwrap();

        // The second turn saw the whole first turn
        let requests = assistant.llm().recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(assistant.store().get("t1").messages.len(), 5);
    }

    #[tokio::test]
    async fn test_clear_and_evict() {
        let assistant = TestAssistantBuilder::new().build();
        assistant.llm().queue_response(LlmResponse::text("a"));
        assistant.llm().queue_response(LlmResponse::text("b"));
        assistant.submit_turn_at(Some("old"), "hi", t0()).await.unwrap();
        assistant
            .submit_turn_at(Some("new"), "hi", t0() + ChronoDuration::hours(30))
            .await
            .unwrap();

        let evicted = assistant.evict_idle(t0() + ChronoDuration::hours(24)).await;
        assert_eq!(evicted, 1);
        assert_eq!(assistant.store().thread_count(), 1);

        assert!(assistant.clear_thread("new").await);
        assert_eq!(assistant.store().thread_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_waits_for_in_flight_turn() {
        let llm = MockLlmClient::new("mock-model").with_delay(Duration::from_millis(100));
        let assistant = Arc::new(TestAssistantBuilder::new().llm(llm).build());
        assistant.llm().queue_response(LlmResponse::text("r1"));

        let turn = tokio::spawn({
            let assistant = assistant.clone();
            async move { assistant.submit_turn_at(Some("t1"), "secret", t0()).await }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(assistant.clear_thread("t1").await);
        assert_eq!(turn.await.unwrap().unwrap(), "r1");

        // The turn finished before the clear, so nothing from it survives
        assert_eq!(assistant.store().thread_count(), 0);
        assert_eq!(
            assistant.store().get("t1").messages,
            vec![Message::anchor("t1")]
        );
    }

    #[tokio::test]
    async fn test_clear_unknown_thread() {
        let assistant = TestAssistantBuilder::new().build();
        assert!(!assistant.clear_thread("nobody").await);
    }

    // ------------------------------------------------------------------------
    // Whole turns against the real operation registry
    // ------------------------------------------------------------------------

    fn clinic_assistant() -> (
        Assistant<MockLlmClient, ToolRegistryExecutor>,
        Arc<SqliteClinic>,
    ) {
        let clinic = Arc::new(SqliteClinic::open_in_memory().unwrap());
        let tools = ToolRegistryExecutor::new(
            ToolRegistry::standard(),
            clinic.clone(),
            Arc::new(ModelRegistry::new_empty()),
        );
        let assistant = Assistant::new(
            AssistantConfig::default(),
            MockLlmClient::new("mock-model"),
            tools,
        );
        (assistant, clinic)
    }

    #[tokio::test]
    async fn test_lists_doctors_then_asks_for_confirmation() {
        let (assistant, clinic) = clinic_assistant();
        assistant
            .llm()
            .queue_response(batch("", &[("c1", "doctor_list", json!({}))]));
        assistant.llm().queue_response(LlmResponse::text(
            "Dr. Rokeya Khatun is available next Monday, March 09, 2026. \
             May I have the patient's name and age to confirm?",
        ));

        let reply = assistant
            .submit_turn_at(Some("t1"), "Book me with Dr. Khatun next Monday", t0())
            .await
            .unwrap();
        assert!(reply.ends_with("to confirm?"));

        let listed = last_result(&assistant.llm().recorded_requests()[1]);
        assert!(!listed.is_error());
        assert!(listed.render().contains("Dr. Rokeya Khatun"));

        assert!(clinic.list_appointments("t1").await.unwrap().is_empty());
        assert_eq!(assistant.operations().len(), 6);
    }

    #[tokio::test]
    async fn test_booking_failure_is_retold_by_model() {
        let (assistant, clinic) = clinic_assistant();
        assistant.llm().queue_response(batch(
            "",
            &[(
                "b1",
                "doctor_appointment",
                json!({
                    "user_id": "t1",
                    "doctor_id": 999,
                    "appointment_date": "2026-03-09",
                    "patient_name": "Ayesha",
                    "patient_age": 34
                }),
            )],
        ));
        assistant.llm().queue_response(LlmResponse::text(
            "I couldn't find that doctor. Would you like to see the list?",
        ));

        let reply = assistant
            .submit_turn_at(Some("t1"), "Yes, that's correct", t0())
            .await
            .unwrap();
        assert_eq!(reply, "I couldn't find that doctor. Would you like to see the list?");

        let result = last_result(&assistant.llm().recorded_requests()[1]);
        assert_eq!(result.render(), "Error: Doctor not found");
        assert!(clinic.list_appointments("t1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_booking_uses_thread_identity() {
        let (assistant, clinic) = clinic_assistant();
        assistant.llm().queue_response(batch(
            "Booking now.",
            &[(
                "b1",
                "doctor_appointment",
                json!({
                    "user_id": "someone-else",
                    "doctor_id": "2",
                    "appointment_date": "2026-03-09",
                    "patient_name": "Ayesha",
                    "patient_age": "34"
                }),
            )],
        ));
        assistant
            .llm()
            .queue_response(LlmResponse::text("You're booked, serial number 1."));

        assistant
            .submit_turn_at(Some("t1"), "Yes, please book it", t0())
            .await
            .unwrap();

        let booked = clinic.list_appointments("t1").await.unwrap();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].patient_name, "Ayesha");
        assert!(clinic
            .list_appointments("someone-else")
            .await
            .unwrap()
            .is_empty());
    }
}
