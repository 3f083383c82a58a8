//! Thread list cache.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::api::ApiClient;
use crate::models::{Thread, DEFAULT_THREAD_TITLE};

use super::status::{Operation, StatusBoard};
use super::StoreResult;

#[derive(Debug, Default)]
struct ThreadState {
    /// Threads in the order the server returned or the client appended them
    threads: Vec<Thread>,
    current_thread_id: Option<String>,
}

/// Session-scoped cache of conversation threads plus the current selection.
#[derive(Debug)]
pub struct ThreadStore {
    api: Arc<ApiClient>,
    state: Mutex<ThreadState>,
    status: StatusBoard,
}

impl ThreadStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            state: Mutex::new(ThreadState::default()),
            status: StatusBoard::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, ThreadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole collection with the server's thread list.
    pub async fn fetch_threads(&self) -> StoreResult<()> {
        let request = self.status.begin(Operation::FetchThreads);
        match self.api.list_threads().await {
            Ok(threads) => {
                debug!(count = threads.len(), "Fetched thread list");
                self.state().threads = threads;
                Ok(())
            }
            Err(err) => Err(request.fail(err)),
        }
    }

    /// Re-read one thread from the server and update the cached copy,
    /// appending it if it is not cached yet.
    pub async fn refresh_thread(&self, thread_id: &str) -> StoreResult<Thread> {
        let request = self.status.begin(Operation::FetchThread);
        match self.api.get_thread(thread_id).await {
            Ok(thread) => {
                let mut state = self.state();
                match state.threads.iter_mut().find(|t| t.id == thread.id) {
                    Some(slot) => *slot = thread.clone(),
                    None => state.threads.push(thread.clone()),
                }
                Ok(thread)
            }
            Err(err) => Err(request.fail(err)),
        }
    }

    /// Create a thread (titled "New conversation" when `title` is `None`),
    /// append it, and make it current.
    pub async fn create_thread(&self, title: Option<&str>) -> StoreResult<Thread> {
        let title = title.unwrap_or(DEFAULT_THREAD_TITLE);
        let request = self.status.begin(Operation::CreateThread);
        match self.api.create_thread(title).await {
            Ok(thread) => {
                debug!(thread_id = %thread.id, "Created thread");
                let mut state = self.state();
                state.threads.push(thread.clone());
                state.current_thread_id = Some(thread.id.clone());
                Ok(thread)
            }
            Err(err) => Err(request.fail(err)),
        }
    }

    /// Rename a thread. The cached copy is replaced in place; if the thread
    /// is not cached the local collection is left alone.
    pub async fn update_thread(&self, thread_id: &str, title: &str) -> StoreResult<Thread> {
        let request = self.status.begin(Operation::UpdateThread);
        match self.api.update_thread(thread_id, title).await {
            Ok(thread) => {
                let mut state = self.state();
                if let Some(slot) = state.threads.iter_mut().find(|t| t.id == thread_id) {
                    *slot = thread.clone();
                } else {
                    debug!(thread_id, "Updated thread is not cached; local list unchanged");
                }
                Ok(thread)
            }
            Err(err) => Err(request.fail(err)),
        }
    }

    /// Delete a thread, dropping the selection if it was current.
    pub async fn delete_thread(&self, thread_id: &str) -> StoreResult<()> {
        let request = self.status.begin(Operation::DeleteThread);
        match self.api.delete_thread(thread_id).await {
            Ok(()) => {
                let mut state = self.state();
                state.threads.retain(|t| t.id != thread_id);
                if state.current_thread_id.as_deref() == Some(thread_id) {
                    state.current_thread_id = None;
                }
                Ok(())
            }
            Err(err) => Err(request.fail(err)),
        }
    }

    /// Point the selection at `thread_id` (or clear it).
    ///
    /// The id is not checked against the cache: a route may name a thread
    /// before the list has loaded.
    pub fn set_current(&self, thread_id: Option<&str>) {
        let mut state = self.state();
        if let Some(id) = thread_id {
            if !state.threads.iter().any(|t| t.id == id) {
                debug!(thread_id = id, "Selecting a thread that is not cached");
            }
        }
        state.current_thread_id = thread_id.map(str::to_string);
    }

    pub fn clear_error(&self) {
        self.status.clear_error();
    }

    /// Snapshot of the cached threads in stored order.
    pub fn threads(&self) -> Vec<Thread> {
        self.state().threads.clone()
    }

    /// Cached thread by id.
    pub fn get_thread(&self, thread_id: &str) -> Option<Thread> {
        self.state().threads.iter().find(|t| t.id == thread_id).cloned()
    }

    pub fn current_thread_id(&self) -> Option<String> {
        self.state().current_thread_id.clone()
    }

    /// The selected thread, if it is cached.
    pub fn current_thread(&self) -> Option<Thread> {
        let state = self.state();
        let id = state.current_thread_id.as_deref()?;
        state.threads.iter().find(|t| t.id == id).cloned()
    }

    pub fn has_threads(&self) -> bool {
        !self.state().threads.is_empty()
    }

    /// Threads ordered by `updated_at`, newest first. Ties keep stored order.
    pub fn sorted_threads(&self) -> Vec<Thread> {
        let mut threads = self.threads();
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        threads
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    /// Most recent user-facing error.
    pub fn error(&self) -> Option<String> {
        self.status.error()
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::store::test_support::{api, thread_json, url};
    use crate::store::StoreError;
    use crate::traits::HttpError;
    use serde_json::json;

    fn store_with_threads(mock: &MockHttpClient, threads: serde_json::Value) -> ThreadStore {
        mock.set_response(
            "GET",
            &url("/threads"),
            MockResponse::json(200, json!({ "threads": threads })),
        );
        ThreadStore::new(api(mock))
    }

    fn ids(threads: &[Thread]) -> Vec<&str> {
        threads.iter().map(|t| t.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_fetch_threads_replaces_collection() {
        let mock = MockHttpClient::new();
        let store = store_with_threads(
            &mock,
            json!([
                thread_json("t1", "One", "2024-03-01T10:00:00"),
                thread_json("t2", "Two", "2024-03-01T11:00:00")
            ]),
        );

        store.fetch_threads().await.unwrap();
        assert_eq!(ids(&store.threads()), vec!["t1", "t2"]);
        assert!(store.has_threads());

        mock.set_response(
            "GET",
            &url("/threads"),
            MockResponse::json(
                200,
                json!({"threads": [thread_json("t3", "Three", "2024-03-01T12:00:00")]}),
            ),
        );
        store.fetch_threads().await.unwrap();

        assert_eq!(ids(&store.threads()), vec!["t3"]);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_fetch_threads_failure_sets_error_and_propagates() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "GET",
            &url("/threads"),
            MockResponse::Error(HttpError::ConnectionFailed("refused".to_string())),
        );
        let store = ThreadStore::new(api(&mock));

        let err = store.fetch_threads().await.unwrap_err();

        assert!(matches!(err, StoreError::Api(_)));
        assert_eq!(store.error().as_deref(), Some("failed to fetch thread list"));
        assert!(!store.is_loading());
        assert!(!store.has_threads());
    }

    #[tokio::test]
    async fn test_create_thread_appends_and_selects() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "POST",
            &url("/threads"),
            MockResponse::json(201, thread_json("t1", "Demo", "2024-03-01T10:00:00")),
        );
        let store = ThreadStore::new(api(&mock));

        let thread = store.create_thread(Some("Demo")).await.unwrap();

        assert_eq!(thread.title, "Demo");
        assert_eq!(store.threads().len(), 1);
        assert_eq!(store.current_thread_id().as_deref(), Some("t1"));
        assert_eq!(store.current_thread().map(|t| t.id), Some("t1".to_string()));
    }

    #[tokio::test]
    async fn test_create_thread_default_title() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "POST",
            &url("/threads"),
            MockResponse::json(201, thread_json("t1", DEFAULT_THREAD_TITLE, "2024-03-01T10:00:00")),
        );
        let store = ThreadStore::new(api(&mock));

        store.create_thread(None).await.unwrap();

        assert_eq!(
            mock.get_requests()[0].json_body(),
            Some(json!({"title": "New conversation"}))
        );
    }

    #[tokio::test]
    async fn test_create_thread_failure_leaves_collection() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "POST",
            &url("/threads"),
            MockResponse::json(500, json!({"error": "boom"})),
        );
        let store = ThreadStore::new(api(&mock));

        let err = store.create_thread(Some("x")).await.unwrap_err();

        assert_eq!(err.api_error().and_then(|e| e.status()), Some(500));
        assert_eq!(store.error().as_deref(), Some("failed to create thread"));
        assert!(store.threads().is_empty());
        assert!(store.current_thread_id().is_none());
    }

    #[tokio::test]
    async fn test_update_thread_replaces_in_place() {
        let mock = MockHttpClient::new();
        let store = store_with_threads(
            &mock,
            json!([
                thread_json("t1", "One", "2024-03-01T10:00:00"),
                thread_json("t2", "Two", "2024-03-01T11:00:00")
            ]),
        );
        store.fetch_threads().await.unwrap();
        mock.set_response(
            "PUT",
            &url("/threads/t1"),
            MockResponse::json(200, thread_json("t1", "Renamed", "2024-03-01T13:00:00")),
        );

        let updated = store.update_thread("t1", "Renamed").await.unwrap();

        assert_eq!(updated.title, "Renamed");
        let threads = store.threads();
        assert_eq!(ids(&threads), vec!["t1", "t2"]);
        assert_eq!(threads[0].title, "Renamed");
    }

    #[tokio::test]
    async fn test_update_uncached_thread_is_local_noop() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "PUT",
            &url("/threads/ghost"),
            MockResponse::json(200, thread_json("ghost", "Renamed", "2024-03-01T13:00:00")),
        );
        let store = ThreadStore::new(api(&mock));

        let updated = store.update_thread("ghost", "Renamed").await.unwrap();

        assert_eq!(updated.id, "ghost");
        assert!(store.threads().is_empty());
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_current_thread_clears_selection() {
        let mock = MockHttpClient::new();
        let store = store_with_threads(
            &mock,
            json!([
                thread_json("t1", "One", "2024-03-01T10:00:00"),
                thread_json("t2", "Two", "2024-03-01T11:00:00")
            ]),
        );
        store.fetch_threads().await.unwrap();
        store.set_current(Some("t1"));
        mock.set_response("DELETE", &url("/threads/t1"), MockResponse::status(200));

        store.delete_thread("t1").await.unwrap();

        assert_eq!(ids(&store.threads()), vec!["t2"]);
        assert!(store.current_thread_id().is_none());
        assert!(store.current_thread().is_none());
    }

    #[tokio::test]
    async fn test_delete_other_thread_keeps_selection() {
        let mock = MockHttpClient::new();
        let store = store_with_threads(
            &mock,
            json!([
                thread_json("t1", "One", "2024-03-01T10:00:00"),
                thread_json("t2", "Two", "2024-03-01T11:00:00")
            ]),
        );
        store.fetch_threads().await.unwrap();
        store.set_current(Some("t1"));
        mock.set_response("DELETE", &url("/threads/t2"), MockResponse::status(200));

        store.delete_thread("t2").await.unwrap();

        assert_eq!(store.current_thread_id().as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_thread() {
        let mock = MockHttpClient::new();
        let store =
            store_with_threads(&mock, json!([thread_json("t1", "One", "2024-03-01T10:00:00")]));
        store.fetch_threads().await.unwrap();
        mock.set_response("DELETE", &url("/threads/t1"), MockResponse::status(404));

        assert!(store.delete_thread("t1").await.is_err());

        assert_eq!(store.threads().len(), 1);
        assert_eq!(store.error().as_deref(), Some("failed to delete thread"));
    }

    #[tokio::test]
    async fn test_refresh_thread_updates_or_appends() {
        let mock = MockHttpClient::new();
        let store =
            store_with_threads(&mock, json!([thread_json("t1", "One", "2024-03-01T10:00:00")]));
        store.fetch_threads().await.unwrap();
        mock.set_response(
            "GET",
            &url("/threads/t1"),
            MockResponse::json(200, thread_json("t1", "One", "2024-03-01T15:00:00")),
        );
        mock.set_response(
            "GET",
            &url("/threads/t2"),
            MockResponse::json(200, thread_json("t2", "Two", "2024-03-01T09:30:00")),
        );

        store.refresh_thread("t1").await.unwrap();
        store.refresh_thread("t2").await.unwrap();

        let threads = store.threads();
        assert_eq!(ids(&threads), vec!["t1", "t2"]);
        assert_eq!(threads[0].updated_at.to_rfc3339(), "2024-03-01T15:00:00+00:00");
    }

    #[test]
    fn test_set_current_accepts_unknown_id() {
        let mock = MockHttpClient::new();
        let store = ThreadStore::new(api(&mock));

        store.set_current(Some("not-cached"));

        assert_eq!(store.current_thread_id().as_deref(), Some("not-cached"));
        assert!(store.current_thread().is_none());
        assert_eq!(mock.request_count(), 0);

        store.set_current(None);
        assert!(store.current_thread_id().is_none());
    }

    #[tokio::test]
    async fn test_sorted_threads_newest_first_and_stable() {
        let mock = MockHttpClient::new();
        let store = store_with_threads(
            &mock,
            json!([
                thread_json("t1", "10:00", "2024-03-01T10:00:00"),
                thread_json("t2", "12:00", "2024-03-01T12:00:00"),
                thread_json("t3", "11:00", "2024-03-01T11:00:00"),
                thread_json("t4", "12:00 again", "2024-03-01T12:00:00")
            ]),
        );
        store.fetch_threads().await.unwrap();

        assert_eq!(ids(&store.sorted_threads()), vec!["t2", "t4", "t3", "t1"]);
        // The stored order is untouched.
        assert_eq!(ids(&store.threads()), vec!["t1", "t2", "t3", "t4"]);
    }

    #[tokio::test]
    async fn test_clear_error() {
        let mock = MockHttpClient::new();
        mock.set_response("GET", &url("/threads"), MockResponse::status(500));
        let store = ThreadStore::new(api(&mock));
        let _ = store.fetch_threads().await;
        assert!(store.error().is_some());

        store.clear_error();

        assert!(store.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_failure_does_not_clear_other_request() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "GET",
            &url("/threads"),
            MockResponse::json(200, json!({"threads": []}))
                .after(std::time::Duration::from_secs(5)),
        );
        mock.set_response("POST", &url("/threads"), MockResponse::status(500));
        let store = ThreadStore::new(api(&mock));

        let fetch = store.fetch_threads();
        let create = async {
            let result = store.create_thread(Some("x")).await;
            // The slow fetch is still in flight after the create has failed.
            assert!(store.is_loading());
            assert!(store.status().is_busy(Operation::FetchThreads));
            result
        };
        let (fetched, created) = tokio::join!(fetch, create);

        assert!(fetched.is_ok());
        assert!(created.is_err());
        assert!(!store.is_loading());
        assert_eq!(store.error().as_deref(), Some("failed to create thread"));
    }
}
