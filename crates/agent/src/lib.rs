//! The conversation side of chatloop.
//!
//! - [`chat`]: the interactive loop (read a line, generate, print, record)
//! - [`chain`]: prompt templates bound to a model, and pipelines of them
//! - [`tool_agent`]: a loop that lets the model call tools until it answers
//! - [`demo`]: the one-shot demos behind `chatloop demo`
//!
//! Everything talks to the model through [`chatloop_core::Provider`].

pub mod chain;
pub mod chat;
pub mod demo;
pub mod tool_agent;
pub mod usage;

#[cfg(test)]
mod test_helpers;

pub use chain::{LlmChain, SequentialChain};
pub use chat::{ChatLoop, LoopExit, StopCondition, SummaryDisplay, parse_temperature};
pub use demo::{Demo, DemoRunner};
pub use tool_agent::ToolAgent;
pub use usage::UsageTracker;
