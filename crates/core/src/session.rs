//! Per-session conversation state.
//!
//! A session owns the turn log, the bounded buffer of completed-turn
//! contexts, the current labels shown to the user, and the rolling summary.
//! One session is driven by one caller at a time; turns are sequential.

use crate::message::Turn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Emotion label a fresh session starts with.
pub const DEFAULT_EMOTION: &str = "neutral";

/// Issue label a fresh session starts with.
pub const DEFAULT_ISSUE: &str = "General Wellness";

/// Maximum number of completed-turn contexts retained per session.
pub const CONTEXT_CAPACITY: usize = 20;

/// How many trailing contexts feed the "recent issues" view.
pub const RECENT_ISSUES: usize = 5;

/// A snapshot of one completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub bot_response: String,
    pub emotion: String,
    pub issue: String,
}

impl ContextEntry {
    pub fn new(
        user_message: impl Into<String>,
        bot_response: impl Into<String>,
        emotion: impl Into<String>,
        issue: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_message: user_message.into(),
            bot_response: bot_response.into(),
            emotion: emotion.into(),
            issue: issue.into(),
        }
    }
}

/// FIFO ring of [`ContextEntry`] values. Pushing past capacity evicts the
/// oldest entry; iteration is oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBuffer {
    entries: VecDeque<ContextEntry>,
    capacity: usize,
}

impl ContextBuffer {
    pub fn new() -> Self {
        Self::with_capacity(CONTEXT_CAPACITY)
    }

    /// A buffer holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: ContextEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ContextEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The trailing `n` entries, oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &ContextEntry> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ContextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the agent remembers about one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Identifies the session in logs; regenerated on clear
    pub id: Uuid,

    /// Chronological turn log
    pub turns: Vec<Turn>,

    /// Completed-turn snapshots, newest last
    pub contexts: ContextBuffer,

    /// Emotion label from the most recent turn
    pub current_emotion: String,

    /// Issue label from the most recent turn
    pub current_issue: String,

    /// Activity suggestions from the most recent turn
    pub current_activities: Vec<String>,

    /// Rolling summary of the conversation; empty until the first one lands
    pub summary: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: Vec::new(),
            contexts: ContextBuffer::new(),
            current_emotion: DEFAULT_EMOTION.to_string(),
            current_issue: DEFAULT_ISSUE.to_string(),
            current_activities: Vec::new(),
            summary: String::new(),
        }
    }

    /// Reset to the initial state.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Issues recorded in the last five contexts, oldest first.
    pub fn recent_issues(&self) -> Vec<String> {
        self.contexts
            .last_n(RECENT_ISSUES)
            .map(|c| c.issue.clone())
            .collect()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
