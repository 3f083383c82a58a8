//! Message cache for the thread being viewed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::debug;

use crate::api::ApiClient;
use crate::models::{Message, MessageDraft, SendMessageResponse, OPTIMISTIC_ID_PREFIX};

use super::status::{Operation, StatusBoard};
use super::{validate_send, StoreResult};

/// What a call to [`MessageStore::fetch_messages`] did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The collection was replaced with this many messages
    Loaded(usize),
    /// No thread was given; the collection was emptied without a request
    Cleared,
    /// Another thread became active while the request was in flight, so the
    /// response was dropped
    Stale,
}

#[derive(Debug, Default)]
struct MessageState {
    /// Thread the collection belongs to
    thread_id: Option<String>,
    /// Bumped whenever the collection is cleared or switched to another thread
    generation: u64,
    messages: Vec<Message>,
    optimistic_seq: u64,
}

impl MessageState {
    /// Empty the collection and make `thread_id` the active thread.
    fn switch_to(&mut self, thread_id: Option<&str>) {
        self.messages.clear();
        self.thread_id = thread_id.map(str::to_string);
        self.generation += 1;
    }

    /// Whether `thread_id` is still active and nothing was cleared since
    /// `generation` was observed.
    fn is_current(&self, thread_id: &str, generation: u64) -> bool {
        self.generation == generation && self.thread_id.as_deref() == Some(thread_id)
    }
}

/// Session-scoped cache of the messages of one thread.
///
/// Every message held belongs to the active thread. Switching threads clears
/// the collection before the new thread's messages are requested, and a
/// response for a thread that is no longer active is discarded.
#[derive(Debug)]
pub struct MessageStore {
    api: Arc<ApiClient>,
    state: Mutex<MessageState>,
    status: StatusBoard,
}

impl MessageStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: Mutex::new(MessageState::default()),
            status: StatusBoard::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, MessageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the messages of `thread_id`, replacing the collection.
    ///
    /// `None` or an empty id means "no thread selected": the collection is
    /// cleared and no request is made.
    pub async fn fetch_messages(&self, thread_id: Option<&str>) -> StoreResult<FetchOutcome> {
        let thread_id = match thread_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                self.state().switch_to(None);
                return Ok(FetchOutcome::Cleared);
            }
        };

        let generation = {
            let mut state = self.state();
            if state.thread_id.as_deref() != Some(thread_id) {
                state.switch_to(Some(thread_id));
            }
            state.generation
        };

        let request = self.status.begin(Operation::FetchMessages);
        let result = self.api.list_messages(thread_id).await;

        let mut state = self.state();
        if !state.is_current(thread_id, generation) {
            debug!(
                thread_id,
                active = ?state.thread_id,
                "Discarding messages for a thread that is no longer active"
            );
            return match result {
                Ok(_) => Ok(FetchOutcome::Stale),
                Err(err) => Err(request.discard(err)),
            };
        }
        match result {
            Ok(messages) => {
                let count = messages.len();
                state.messages = messages;
                Ok(FetchOutcome::Loaded(count))
            }
            Err(err) => Err(request.fail(err)),
        }
    }

    /// Send `content` to `thread_id` and append the persisted user message
    /// followed by the assistant reply.
    ///
    /// Fails with [`StoreError::Validation`](super::StoreError::Validation)
    /// before any request when the thread id is empty or the content is
    /// blank. With no active thread the send makes `thread_id` active. A
    /// reply arriving after the collection was cleared or switched to
    /// another thread is returned but not appended.
    pub async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> StoreResult<SendMessageResponse> {
        validate_send(thread_id, content)?;

        let generation = {
            let mut state = self.state();
            if state.thread_id.is_none() {
                state.thread_id = Some(thread_id.to_string());
            }
            state.generation
        };

        let request = self.status.begin(Operation::SendMessage);
        match self.api.send_message(thread_id, content).await {
            Ok(response) => {
                let mut state = self.state();
                if state.is_current(thread_id, generation) {
                    state.messages.push(response.user_message.clone());
                    state.messages.push(response.assistant_message.clone());
                } else {
                    debug!(
                        thread_id,
                        active = ?state.thread_id,
                        "Reply belongs to an inactive thread; not appending"
                    );
                }
                Ok(response)
            }
            Err(err) => Err(request.fail(err)),
        }
    }

    /// Delete a message on the server and drop it from the collection.
    pub async fn delete_message(&self, message_id: &str) -> StoreResult<()> {
        let request = self.status.begin(Operation::DeleteMessage);
        match self.api.delete_message(message_id).await {
            Ok(()) => {
                self.state().messages.retain(|m| m.id != message_id);
                Ok(())
            }
            Err(err) => Err(request.fail(err)),
        }
    }

    /// Empty the collection and forget recorded errors (used on thread switch).
    pub fn clear_messages(&self) {
        self.state().switch_to(None);
        self.status.clear_error();
    }

    /// Make `thread_id` the active thread with an empty collection, e.g. for
    /// a thread that was just created. Replies still in flight for any other
    /// thread are dropped when they arrive.
    pub fn activate(&self, thread_id: &str) {
        self.state().switch_to(Some(thread_id));
        self.status.clear_error();
    }

    pub fn clear_error(&self) {
        self.status.clear_error();
    }

    /// Append a local placeholder for `draft` and return its temporary id.
    pub fn add_optimistic_message(&self, draft: MessageDraft) -> String {
        let mut state = self.state();
        let now = Utc::now();
        let id = format!(
            "{}{}-{}",
            OPTIMISTIC_ID_PREFIX,
            now.timestamp_millis(),
            state.optimistic_seq
        );
        state.optimistic_seq += 1;

        let message = Message {
            id: id.clone(),
            thread_id: state.thread_id.clone().unwrap_or_default(),
            role: draft.role,
            content: draft.content,
            created_at: now,
        };
        debug!(message_id = %id, "Added optimistic message");
        state.messages.push(message);
        id
    }

    /// Remove the placeholder with `temp_id`. Returns whether it was present.
    pub fn remove_optimistic_message(&self, temp_id: &str) -> bool {
        let mut state = self.state();
        let before = state.messages.len();
        state.messages.retain(|m| m.id != temp_id);
        state.messages.len() != before
    }

    /// Snapshot of the collection in insertion order.
    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    pub fn has_messages(&self) -> bool {
        !self.state().messages.is_empty()
    }

    /// Messages ordered by `created_at`, oldest first. Ties keep insertion order.
    pub fn sorted_messages(&self) -> Vec<Message> {
        let mut messages = self.messages();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        messages
    }

    /// The last message inserted. This is insertion order, not the newest
    /// `created_at`.
    pub fn latest_message(&self) -> Option<Message> {
        self.state().messages.last().cloned()
    }

    /// Thread the collection currently belongs to.
    pub fn active_thread_id(&self) -> Option<String> {
        self.state().thread_id.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn is_sending(&self) -> bool {
        self.status.is_sending()
    }

    pub fn error(&self) -> Option<String> {
        self.status.error()
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }
}
