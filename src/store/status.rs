//! Busy and error bookkeeping shared by the stores.
//!
//! Every store action registers itself with [`StatusBoard::begin`] and gets
//! back an [`InFlight`] guard. The guard's token is removed when it drops, so
//! busy flags clear on every exit path, including a cancelled future. Errors
//! are kept per [`Operation`], which stops one failing request from clobbering
//! the state of an unrelated one still in flight.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::api::ApiError;

use super::StoreError;

/// The store actions that talk to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchThreads,
    FetchThread,
    CreateThread,
    UpdateThread,
    DeleteThread,
    FetchMessages,
    SendMessage,
    DeleteMessage,
}

impl Operation {
    /// The fixed message shown to the user when this operation fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::FetchThreads => "failed to fetch thread list",
            Operation::FetchThread => "failed to fetch thread",
            Operation::CreateThread => "failed to create thread",
            Operation::UpdateThread => "failed to update thread",
            Operation::DeleteThread => "failed to delete thread",
            Operation::FetchMessages => "failed to fetch messages",
            Operation::SendMessage => "failed to send message",
            Operation::DeleteMessage => "failed to delete message",
        }
    }

    /// Sends are tracked by the "sending" flag, everything else by "loading".
    pub fn is_send(&self) -> bool {
        matches!(self, Operation::SendMessage)
    }
}

/// Identifies one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

#[derive(Debug)]
struct RecordedError {
    message: String,
    seq: u64,
}

#[derive(Debug, Default)]
struct Board {
    next_token: u64,
    next_error_seq: u64,
    in_flight: HashMap<RequestToken, Operation>,
    errors: HashMap<Operation, RecordedError>,
}

/// Transient, UI-facing status of one store.
#[derive(Debug, Default)]
pub struct StatusBoard {
    inner: Mutex<Board>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn board(&self) -> MutexGuard<'_, Board> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a request for `operation`, clearing that operation's previous error.
    pub fn begin(&self, operation: Operation) -> InFlight<'_> {
        let mut board = self.board();
        let token = RequestToken(board.next_token);
        board.next_token += 1;
        board.in_flight.insert(token, operation);
        board.errors.remove(&operation);

        InFlight {
            board: self,
            token,
            operation,
        }
    }

    fn finish(&self, token: RequestToken) {
        self.board().in_flight.remove(&token);
    }

    fn record_error(&self, operation: Operation, message: &str) {
        let mut board = self.board();
        let seq = board.next_error_seq;
        board.next_error_seq += 1;
        board.errors.insert(
            operation,
            RecordedError {
                message: message.to_string(),
                seq,
            },
        );
    }

    /// True while any non-send request is in flight.
    pub fn is_loading(&self) -> bool {
        self.board().in_flight.values().any(|op| !op.is_send())
    }

    /// True while a send is in flight.
    pub fn is_sending(&self) -> bool {
        self.board().in_flight.values().any(|op| op.is_send())
    }

    /// True while a request for `operation` is in flight.
    pub fn is_busy(&self, operation: Operation) -> bool {
        self.board().in_flight.values().any(|op| *op == operation)
    }

    /// Number of requests currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.board().in_flight.len()
    }

    /// The most recently recorded error, if any.
    pub fn error(&self) -> Option<String> {
        self.board()
            .errors
            .values()
            .max_by_key(|err| err.seq)
            .map(|err| err.message.clone())
    }

    /// The error recorded for a specific operation.
    pub fn error_for(&self, operation: Operation) -> Option<String> {
        self.board()
            .errors
            .get(&operation)
            .map(|err| err.message.clone())
    }

    /// Forget all recorded errors. In-flight requests are unaffected.
    pub fn clear_error(&self) {
        self.board().errors.clear();
    }
}

/// Guard for one in-flight request; see [`StatusBoard::begin`].
#[must_use = "dropping the guard immediately marks the request as finished"]
#[derive(Debug)]
pub struct InFlight<'a> {
    board: &'a StatusBoard,
    token: RequestToken,
    operation: Operation,
}

impl InFlight<'_> {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Record this operation's failure message and hand back the error for
    /// the caller to propagate.
    pub fn fail(self, err: ApiError) -> StoreError {
        let message = self.operation.failure_message();
        warn!(operation = ?self.operation, error = %err, "{}", message);
        self.board.record_error(self.operation, message);
        StoreError::Api(err)
    }

    /// Hand back the error without recording it, for a failure whose result
    /// the store no longer wants.
    pub fn discard(self, err: ApiError) -> StoreError {
        debug!(operation = ?self.operation, error = %err, "Ignoring failure of a stale request");
        StoreError::Api(err)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.board.finish(self.token);
    }
}
