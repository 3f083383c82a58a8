use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{deserialize_id, deserialize_nullable_string, deserialize_timestamp};

/// Title used when a thread is created without one.
pub const DEFAULT_THREAD_TITLE: &str = "New conversation";

/// Represents a conversation thread from the backend API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    /// Unique identifier assigned by the backend
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Display title
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub title: String,
    /// When the thread was created
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    /// When the thread was last updated (a sent message bumps this)
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}
