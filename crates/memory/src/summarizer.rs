//! LLM-backed summarizer.

use async_trait::async_trait;
use chatloop_core::error::ProviderError;
use chatloop_core::memory::Summarizer;
use chatloop_core::message::{Message, transcript};
use chatloop_core::prompt::PromptTemplate;
use chatloop_core::provider::{Provider, ProviderRequest};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const INSTRUCTIONS: &str = "Progressively summarize the lines of conversation provided, \
adding onto the previous summary and returning a new summary. Keep names, facts the \
user stated, and answers already ruled out. Reply with the summary only, in at most \
{budget} tokens.";

const REQUEST: &str = "Current summary:\n{summary}\n\nNew lines of conversation:\n{new_lines}\n\nNew summary:";

/// Summarizes overflow turns with a (usually cheaper) chat model.
pub struct LlmSummarizer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
}

impl LlmSummarizer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
        }
    }

    fn build_messages(
        &self,
        existing: Option<&str>,
        turns: &[Message],
        budget: usize,
    ) -> Result<Vec<Message>, ProviderError> {
        let vars = HashMap::from([
            ("budget".to_string(), budget.to_string()),
            ("summary".to_string(), existing.unwrap_or("(none)").to_string()),
            ("new_lines".to_string(), transcript(turns)),
        ]);
        let render = |source: &str| {
            PromptTemplate::new(source)
                .and_then(|t| t.format(&vars))
                .map_err(|e| ProviderError::NotConfigured(format!("summary prompt: {e}")))
        };
        Ok(vec![
            Message::system(render(INSTRUCTIONS)?),
            Message::user(render(REQUEST)?),
        ])
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        existing: Option<&str>,
        turns: &[Message],
        budget: usize,
    ) -> Result<String, ProviderError> {
        let messages = self.build_messages(existing, turns, budget)?;
        let request = ProviderRequest::new(&self.model, messages, self.temperature);

        debug!(model = %self.model, turns = turns.len(), budget, "Requesting summary");
        let response = self.provider.complete(request).await?;
        Ok(response.message.content.trim().to_string())
    }
}
