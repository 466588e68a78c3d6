//! No-op memory: every request goes out without history.

use async_trait::async_trait;
use chatloop_core::error::MemoryError;
use chatloop_core::memory::{ConversationMemory, MemoryContext};
use chatloop_core::session::Session;

/// A stateless strategy: remembers nothing, contributes nothing.
pub struct NoopMemory;

#[async_trait]
impl ConversationMemory for NoopMemory {
    fn name(&self) -> &str {
        "none"
    }

    fn context(&self, _session: &Session) -> MemoryContext {
        MemoryContext::default()
    }

    async fn record(
        &self,
        _session: &mut Session,
        _user_text: &str,
        _assistant_text: &str,
    ) -> Result<(), MemoryError> {
        Ok(())
    }
}
