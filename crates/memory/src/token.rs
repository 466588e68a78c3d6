//! Token estimation.
//!
//! Character heuristic: ~4 characters per token, rounded up, plus a fixed
//! per-message overhead for the role and delimiters on the wire. Close
//! enough to BPE counts on English text to decide when to summarize.

use chatloop_core::message::Message;

/// Tokens charged per message for role name and framing.
pub const MESSAGE_OVERHEAD: usize = 4;

/// Estimate the token count for a string.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Estimate tokens for a single message including per-message overhead.
pub fn estimate_message_tokens(message: &Message) -> usize {
    MESSAGE_OVERHEAD + estimate_tokens(&message.content)
}

/// Estimate tokens for a slice of messages.
pub fn estimate_messages_tokens(messages: &[Message]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}
