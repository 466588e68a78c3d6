//! Rolling summary buffer.
//!
//! Recent turns stay raw. Once their estimated size exceeds the token
//! limit, the oldest turns are handed to the summarizer together with the
//! current summary, and the returned text replaces both. If the summarizer
//! fails or returns nothing, the popped turns go back where they were.

use async_trait::async_trait;
use chatloop_core::error::MemoryError;
use chatloop_core::memory::{ConversationMemory, MemoryContext, Summarizer};
use chatloop_core::message::Message;
use chatloop_core::session::Session;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::token::{estimate_message_tokens, estimate_messages_tokens};

pub struct SummaryBufferMemory {
    summarizer: Arc<dyn Summarizer>,
    max_token_limit: usize,
}

impl SummaryBufferMemory {
    pub fn new(summarizer: Arc<dyn Summarizer>, max_token_limit: usize) -> Self {
        Self {
            summarizer,
            max_token_limit,
        }
    }

    pub fn max_token_limit(&self) -> usize {
        self.max_token_limit
    }

    /// Fold the oldest turns into the summary until the raw turns fit.
    async fn prune(&self, session: &mut Session) -> Result<(), MemoryError> {
        let mut size = estimate_messages_tokens(session.turns());
        if size <= self.max_token_limit {
            return Ok(());
        }

        let mut pruned: Vec<Message> = Vec::new();
        while size > self.max_token_limit {
            let Some(oldest) = session.pop_oldest() else {
                break;
            };
            size -= estimate_message_tokens(&oldest);
            pruned.push(oldest);
        }

        debug!(
            session_id = %session.id(),
            pruned = pruned.len(),
            kept = session.turns().len(),
            kept_tokens = size,
            "Summarizing overflow turns"
        );

        let existing = session.summary().map(str::to_owned);
        let result = self
            .summarizer
            .summarize(existing.as_deref(), &pruned, self.max_token_limit)
            .await;

        match result {
            Ok(summary) if !summary.trim().is_empty() => {
                session.set_summary(summary.trim());
                Ok(())
            }
            Ok(_) => {
                warn!(session_id = %session.id(), "Summarizer returned empty text, keeping raw turns");
                session.restore_oldest(pruned);
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %session.id(), "Summarization failed, keeping raw turns: {e}");
                session.restore_oldest(pruned);
                Err(MemoryError::Summarization(e))
            }
        }
    }
}

#[async_trait]
impl ConversationMemory for SummaryBufferMemory {
    fn name(&self) -> &str {
        "summary_buffer"
    }

    fn context(&self, session: &Session) -> MemoryContext {
        MemoryContext {
            summary: session.summary().map(str::to_owned),
            turns: session.turns().to_vec(),
        }
    }

    async fn record(
        &self,
        session: &mut Session,
        user_text: &str,
        assistant_text: &str,
    ) -> Result<(), MemoryError> {
        session.push(Message::user(user_text));
        session.push(Message::assistant(assistant_text));
        self.prune(session).await
    }
}
