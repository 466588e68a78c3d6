//! Built-in tools for the chatloop tool agent.

pub mod calculator;

use chatloop_core::tool::ToolRegistry;

/// A registry holding every built-in tool.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(calculator::CalculatorTool));
    registry
}
