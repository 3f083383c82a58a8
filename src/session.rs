//! Chat view orchestration over the two stores.
//!
//! [`ChatSession`] is what a front end drives: it follows the route, keeps
//! the thread selection and the message collection in step, and wraps sends
//! in an optimistic placeholder that is rolled back when the real messages
//! arrive or the send fails.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::api::ApiClient;
use crate::models::{MessageDraft, SendMessageResponse, Thread};
use crate::routing::Route;
use crate::store::{validate_send, FetchOutcome, MessageStore, StoreResult, ThreadStore};

/// One user's chat session: the current route plus both stores.
#[derive(Debug)]
pub struct ChatSession {
    threads: Arc<ThreadStore>,
    messages: Arc<MessageStore>,
    route: Mutex<Route>,
}

impl ChatSession {
    /// Build a session with fresh stores over `api`.
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self::with_stores(
            Arc::new(ThreadStore::new(Arc::clone(&api))),
            Arc::new(MessageStore::new(api)),
        )
    }

    pub fn with_stores(threads: Arc<ThreadStore>, messages: Arc<MessageStore>) -> Self {
        Self {
            threads,
            messages,
            route: Mutex::new(Route::Home),
        }
    }

    fn route_guard(&self) -> MutexGuard<'_, Route> {
        self.route.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn threads(&self) -> &Arc<ThreadStore> {
        &self.threads
    }

    pub fn messages(&self) -> &Arc<MessageStore> {
        &self.messages
    }

    pub fn route(&self) -> Route {
        self.route_guard().clone()
    }

    /// Load the thread list.
    pub async fn load(&self) -> StoreResult<()> {
        self.threads.fetch_threads().await
    }

    /// Move to `route`: select its thread and load that thread's messages.
    ///
    /// Moving to a different thread clears the old messages first. Moving to
    /// [`Route::Home`] clears them without a request.
    pub async fn navigate(&self, route: Route) -> StoreResult<FetchOutcome> {
        let previous = std::mem::replace(&mut *self.route_guard(), route.clone());
        debug!(from = %previous, to = %route, "Navigating");

        self.threads.set_current(route.thread_id());
        if previous.thread_id() != route.thread_id() {
            self.messages.clear_messages();
        }
        self.messages.fetch_messages(route.thread_id()).await
    }

    /// Create a thread and open it. A new thread has no messages, so none are
    /// fetched.
    pub async fn start_thread(&self, title: Option<&str>) -> StoreResult<Thread> {
        let thread = self.threads.create_thread(title).await?;
        *self.route_guard() = Route::Thread(thread.id.clone());
        self.messages.activate(&thread.id);
        info!(thread_id = %thread.id, "Started thread");
        Ok(thread)
    }

    /// Send `content` to the thread on the current route.
    ///
    /// A user placeholder is shown while the request is in flight and removed
    /// once it settles; on success the persisted pair replaces it and the
    /// thread is re-read so its `updated_at` ordering follows the server.
    pub async fn send(&self, content: &str) -> StoreResult<SendMessageResponse> {
        let thread_id = self.route().thread_id().unwrap_or_default().to_string();
        validate_send(&thread_id, content)?;

        let temp_id = self
            .messages
            .add_optimistic_message(MessageDraft::user(content));
        let result = self.messages.send_message(&thread_id, content).await;
        self.messages.remove_optimistic_message(&temp_id);
        let response = result?;

        // The send already succeeded; a failed refresh is recorded on the
        // thread store and the cached ordering just stays as it was.
        if self.threads.refresh_thread(&thread_id).await.is_err() {
            debug!(thread_id = %thread_id, "Thread refresh after send failed");
        }
        Ok(response)
    }

    /// Rename a thread.
    pub async fn rename_thread(&self, thread_id: &str, title: &str) -> StoreResult<Thread> {
        self.threads.update_thread(thread_id, title).await
    }

    /// Delete a thread, going back home if it was the one being viewed.
    pub async fn delete_thread(&self, thread_id: &str) -> StoreResult<()> {
        self.threads.delete_thread(thread_id).await?;
        if self.route().thread_id() == Some(thread_id) {
            self.navigate(Route::Home).await?;
        }
        Ok(())
    }
}
