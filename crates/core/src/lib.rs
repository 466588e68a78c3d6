//! # chatloop core
//!
//! Domain types, traits, and error definitions shared by every chatloop crate.
//! Nothing here talks to the network: the crate defines the model that the
//! provider, memory, tool, and agent crates implement against.
//!
//! ## Layout
//!
//! - [`message`]: role-tagged turns
//! - [`provider`]: the generation call
//! - [`memory`]: conversation-memory strategies and the summarization call
//! - [`session`]: the process-owned session registry
//! - [`prompt`]: `{name}` templates and chat prompts
//! - [`tool`]: tools the model may call

pub mod error;
pub mod memory;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use memory::{ConversationMemory, MemoryContext, Summarizer};
pub use message::{Message, Role};
pub use prompt::{ChatPrompt, PromptPart, PromptTemplate};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use session::{Session, SessionId, SessionRegistry};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
