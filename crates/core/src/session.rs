//! Sessions and the session registry.
//!
//! A [`Session`] owns the raw turns that have not been summarized yet plus
//! the current summary, if any. The [`SessionRegistry`] is created by the
//! process entry point and handed to whatever drives the conversation; there
//! is no process-global store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::message::Message;

/// Opaque session key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One conversation's in-memory state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    turns: Vec<Message>,
    summary: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            turns: Vec::new(),
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Raw turns not folded into the summary, oldest first.
    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append a turn at the end.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.turns.push(message);
    }

    /// Remove and return the oldest raw turn.
    pub fn pop_oldest(&mut self) -> Option<Message> {
        if self.turns.is_empty() {
            return None;
        }
        Some(self.turns.remove(0))
    }

    /// Put previously popped turns back in front, keeping their order.
    pub fn restore_oldest(&mut self, turns: Vec<Message>) {
        self.turns.splice(0..0, turns);
    }

    /// Replace the summary.
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.updated_at = Utc::now();
        self.summary = Some(summary.into());
    }
}

/// Owner of every session in the process, keyed by [`SessionId`].
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a session, creating it on first use of the key.
    pub fn get_or_create(&mut self, id: &SessionId) -> &mut Session {
        self.sessions.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(session_id = %id, "Creating session");
            Session::new(id.clone())
        })
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
