//! Thread-safe token usage tally across provider calls.

use chatloop_core::provider::Usage;
use std::sync::{PoisonError, RwLock};

/// Running totals over every recorded response.
#[derive(Debug, Default)]
pub struct UsageTracker {
    totals: RwLock<Totals>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    usage: Usage,
    calls: u64,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one response's usage. Responses without usage still count as a call.
    pub fn record(&self, usage: Option<&Usage>) {
        let mut totals = self.totals.write().unwrap_or_else(PoisonError::into_inner);
        totals.calls += 1;
        if let Some(u) = usage {
            totals.usage.prompt_tokens += u.prompt_tokens;
            totals.usage.completion_tokens += u.completion_tokens;
            totals.usage.total_tokens += u.total_tokens;
        }
    }

    pub fn total(&self) -> Usage {
        self.totals.read().unwrap_or_else(PoisonError::into_inner).usage
    }

    pub fn total_tokens(&self) -> u32 {
        self.total().total_tokens
    }

    /// Number of provider calls recorded.
    pub fn calls(&self) -> u64 {
        self.totals.read().unwrap_or_else(PoisonError::into_inner).calls
    }
}
