//! Tool-using agent.
//!
//! The model is offered the registry's tool definitions. Each requested tool
//! call is executed and its output appended as a tool message; the loop ends
//! when the model answers with text only.

use chatloop_core::error::Error;
use chatloop_core::message::Message;
use chatloop_core::provider::{Provider, ProviderRequest};
use chatloop_core::tool::{ToolCall, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::usage::UsageTracker;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools \
when they help answer the question, then reply with the final answer.";

pub struct ToolAgent {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    /// Model calls allowed per question
    max_iterations: u32,
    usage: Arc<UsageTracker>,
}

impl ToolAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            tools,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 5,
            usage: Arc::new(UsageTracker::new()),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Share a usage tracker with other callers.
    pub fn with_usage(mut self, usage: Arc<UsageTracker>) -> Self {
        self.usage = usage;
        self
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Answer `input`, calling tools as the model requests.
    pub async fn run(&self, input: &str) -> chatloop_core::Result<String> {
        let mut messages = vec![Message::system(&self.system_prompt), Message::user(input)];
        let tool_definitions = self.tools.definitions();

        info!(tools = tool_definitions.len(), "Running tool agent");

        for iteration in 1..=self.max_iterations {
            debug!(iteration, "Tool agent iteration");

            let mut request = ProviderRequest::new(&self.model, messages.clone(), self.temperature);
            request.tools = tool_definitions.clone();

            let response = self.provider.complete(request).await?;
            self.usage.record(response.usage.as_ref());

            if response.message.tool_calls.is_empty() {
                return Ok(response.message.content);
            }

            debug!(
                tool_count = response.message.tool_calls.len(),
                "Executing tool calls"
            );
            let tool_calls = response.message.tool_calls.clone();
            messages.push(response.message);

            for tc in &tool_calls {
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments).unwrap_or_default(),
                };

                let output = match self.tools.execute(&call).await {
                    Ok(result) => {
                        debug!(tool = %tc.name, success = result.success, "Tool executed");
                        result.output
                    }
                    Err(e) => {
                        warn!(tool = %tc.name, error = %e, "Tool execution failed");
                        // reported back so the model can recover
                        format!("Error: {e}")
                    }
                };
                messages.push(Message::tool_result(&tc.id, output));
            }
        }

        warn!(
            iterations = self.max_iterations,
            "Tool agent gave up without a final answer"
        );
        Err(Error::Internal(format!(
            "no final answer after {} iterations",
            self.max_iterations
        )))
    }
}
