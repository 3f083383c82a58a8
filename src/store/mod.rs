//! Client-side state stores.
//!
//! [`ThreadStore`] caches the thread list and the current selection;
//! [`MessageStore`] caches the messages of the one thread being viewed. Both
//! wrap a shared [`ApiClient`](crate::api::ApiClient): each action performs a
//! single API call, updates the in-memory collection on success, and on
//! failure records a fixed user-facing message before returning the error.
//!
//! Stores take `&self` and guard their state with a mutex, so actions can be
//! awaited concurrently from one task (e.g. with `tokio::join!`). The lock is
//! never held across an `.await`.

mod message;
mod status;
mod thread;

use thiserror::Error;

use crate::api::ApiError;

pub use message::{FetchOutcome, MessageStore};
pub use status::{InFlight, Operation, RequestToken, StatusBoard};
pub use thread::ThreadStore;

/// Raised by `send_message` before any network call.
pub const SEND_VALIDATION_MESSAGE: &str = "thread id and message content are required";

/// Error type for store actions
#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected locally; nothing was sent
    #[error("{0}")]
    Validation(String),
    /// The backend call failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }

    /// The underlying API error, if the failure came from the backend.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            StoreError::Api(err) => Some(err),
            StoreError::Validation(_) => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Reject a send with an empty thread id or blank content.
pub fn validate_send(thread_id: &str, content: &str) -> StoreResult<()> {
    if thread_id.is_empty() || content.trim().is_empty() {
        return Err(StoreError::Validation(SEND_VALIDATION_MESSAGE.to_string()));
    }
    Ok(())
}
