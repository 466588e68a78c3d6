//! Shared test helpers: a scripted provider and response builders.

use chatloop_core::error::ProviderError;
use chatloop_core::message::{Message, MessageToolCall};
use chatloop_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted outcomes and keeps
/// every request it was sent.
///
/// Panics if more calls are made than outcomes provided.
pub struct SequentialMockProvider {
    outcomes: Vec<Result<ProviderResponse, ProviderError>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(outcomes: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            outcomes,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// One text reply per call, in order.
    pub fn texts(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(make_text_response(r))).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);

        match self.outcomes.get(index) {
            Some(outcome) => outcome.clone(),
            None => panic!(
                "SequentialMockProvider: no more responses (call #{index}, have {})",
                self.outcomes.len()
            ),
        }
    }
}

fn mock_usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: mock_usage(),
        model: "mock-model".into(),
    }
}

/// Create a response carrying tool calls.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    let mut msg = Message::assistant("");
    msg.tool_calls = tool_calls;
    ProviderResponse {
        message: msg,
        usage: mock_usage(),
        model: "mock-model".into(),
    }
}

pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}
