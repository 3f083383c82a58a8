use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_timestamp};

/// Prefix marking client-generated placeholder ids.
pub const OPTIMISTIC_ID_PREFIX: &str = "temp-";

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a message within a thread from the backend API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Backend id, or a `temp-` placeholder for optimistic entries
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// ID of the thread this message belongs to
    #[serde(deserialize_with = "deserialize_id")]
    pub thread_id: String,
    /// Role of the message sender
    pub role: MessageRole,
    /// Body text (Markdown for assistant replies)
    pub content: String,
    /// When the message was created
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether this entry is a local placeholder not yet confirmed by the server.
    pub fn is_optimistic(&self) -> bool {
        self.id.starts_with(OPTIMISTIC_ID_PREFIX)
    }
}

/// The parts of a message the caller supplies for an optimistic insert.
/// The store fills in the id, timestamp and thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub role: MessageRole,
    pub content: String,
}

impl MessageDraft {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// A draft authored by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}
