//! Conversation memory strategies for chatloop.
//!
//! Every strategy implements `chatloop_core::ConversationMemory` and is
//! picked once, at startup:
//! - [`NoopMemory`]: stateless
//! - [`BufferMemory`]: keeps every turn
//! - [`SummaryBufferMemory`]: keeps recent turns raw, folds older ones into
//!   a summary produced by a [`chatloop_core::Summarizer`]

pub mod buffer;
pub mod noop;
pub mod summarizer;
pub mod summary_buffer;
pub mod token;

pub use buffer::BufferMemory;
pub use noop::NoopMemory;
pub use summarizer::LlmSummarizer;
pub use summary_buffer::SummaryBufferMemory;
pub use token::{estimate_message_tokens, estimate_messages_tokens, estimate_tokens};
