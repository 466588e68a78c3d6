//! Full-history buffer.

use async_trait::async_trait;
use chatloop_core::error::MemoryError;
use chatloop_core::memory::{ConversationMemory, MemoryContext};
use chatloop_core::message::Message;
use chatloop_core::session::Session;

/// Keeps every exchange verbatim and sends all of it with each request.
pub struct BufferMemory;

#[async_trait]
impl ConversationMemory for BufferMemory {
    fn name(&self) -> &str {
        "buffer"
    }

    fn context(&self, session: &Session) -> MemoryContext {
        MemoryContext {
            summary: None,
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
        Ok(())
    }
}
