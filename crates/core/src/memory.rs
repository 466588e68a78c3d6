//! Conversation-memory trait: what a chat loop remembers between turns.
//!
//! A strategy decides which turns (and which summary) accompany the next
//! generation call. Strategies are chosen once at startup and never
//! switched mid-conversation:
//! - stateless (nothing remembered)
//! - full buffer (every turn remembered)
//! - summary buffer (recent turns raw, older turns folded into a summary)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, ProviderError};
use crate::message::Message;
use crate::session::Session;

/// What a memory strategy contributes to the next generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryContext {
    /// Summary of turns no longer kept raw
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Raw turns, oldest first
    #[serde(default)]
    pub turns: Vec<Message>,
}

impl MemoryContext {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.turns.is_empty()
    }

    /// Flatten into request messages: the summary (as a system message) first,
    /// then the raw turns.
    pub fn to_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        if let Some(summary) = &self.summary {
            messages.push(Message::system(summary.clone()));
        }
        messages.extend(self.turns.iter().cloned());
        messages
    }
}

/// A conversation-memory strategy.
///
/// Implementations: `NoopMemory`, `BufferMemory`, `SummaryBufferMemory`.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// The strategy name (e.g., "none", "buffer", "summary_buffer").
    fn name(&self) -> &str;

    /// The turns and summary to send with the next request.
    fn context(&self, session: &Session) -> MemoryContext;

    /// Record one completed exchange.
    async fn record(
        &self,
        session: &mut Session,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<(), MemoryError>;
}

/// The summarization call.
///
/// Folds `turns` into `existing` (if any) and returns the new summary text,
/// aiming to stay within `budget` tokens.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        existing: Option<&str>,
        turns: &[Message],
        budget: usize,
    ) -> Result<String, ProviderError>;
}
