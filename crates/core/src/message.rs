//! Turn domain types.
//!
//! A turn is one message in the conversation log: either what the user
//! typed or the cleaned empathetic reply the assistant gave back. Turns are
//! value objects: once appended to a session they are never edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The empathetic assistant
    Assistant,
}

impl Role {
    /// The label used when a turn is rendered into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single message in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// When the turn was appended
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}
