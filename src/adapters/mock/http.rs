//! Mock HTTP client for testing.
//!
//! Responses are configured per (method, URL) pair. Every request is
//! recorded so tests can assert that a call did, or did not, reach the wire.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::traits::{Headers, HttpClient, HttpError, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// HTTP method (GET, POST, PUT or DELETE)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST and PUT requests)
    pub body: Option<String>,
}

impl RecordedRequest {
    /// Parse the recorded body as JSON.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_str(body).ok())
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a response (any status)
    Success(Response),
    /// Return a transport error
    Error(HttpError),
    /// Sleep, then resolve to the inner response
    Delayed(Duration, Box<MockResponse>),
}

impl MockResponse {
    /// Shorthand for a JSON response with the given status.
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        MockResponse::Success(Response::json_body(status, &value))
    }

    /// Shorthand for an empty response with the given status.
    pub fn status(status: u16) -> Self {
        MockResponse::Success(Response::new(status, bytes::Bytes::new()))
    }

    /// Wrap this response so it resolves only after `delay`.
    pub fn after(self, delay: Duration) -> Self {
        MockResponse::Delayed(delay, Box::new(self))
    }
}

type RouteKey = (String, String);

/// Mock HTTP client for testing.
///
/// Routes are matched exactly on method and URL. A route can hold a queue of
/// responses (consumed in order, the last one repeating) so sequential calls
/// to the same endpoint can observe different server states.
///
/// # Example
///
/// ```ignore
/// use kaiwa::adapters::mock::{MockHttpClient, MockResponse};
/// use kaiwa::traits::{HttpClient, Headers};
///
/// let client = MockHttpClient::new();
/// let empty = MockResponse::json(200, json!({"threads": []}));
/// client.set_response("GET", "http://api/threads", empty);
///
/// let response = client.get("http://api/threads", &Headers::new()).await?;
/// assert_eq!(response.status, 200);
/// assert_eq!(client.get_requests().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<RouteKey, VecDeque<MockResponse>>>>,
    default_response: Arc<Mutex<Option<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response for a method and URL, replacing any queued ones.
    pub fn set_response(&self, method: &str, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(key(method, url), VecDeque::from([response]));
    }

    /// Queue an additional response for a method and URL.
    pub fn push_response(&self, method: &str, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses
            .entry(key(method, url))
            .or_default()
            .push_back(response);
    }

    /// Set a default response for requests without a specific route.
    pub fn set_default_response(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of recorded requests.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// Clear all configured responses.
    pub fn clear_responses(&self) {
        self.responses.lock().unwrap().clear();
    }

    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<String>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    fn next_response(&self, method: &str, url: &str) -> Option<MockResponse> {
        let mut responses = self.responses.lock().unwrap();
        if let Some(queue) = responses.get_mut(&key(method, url)) {
            let response = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            if response.is_some() {
                return response;
            }
        }
        drop(responses);

        self.default_response.lock().unwrap().clone()
    }

    async fn respond(
        &self,
        method: &str,
        url: &str,
        headers: &Headers,
        body: Option<String>,
    ) -> Result<Response, HttpError> {
        self.record_request(method, url, headers, body);

        let mut next = self.next_response(method, url);
        loop {
            match next {
                Some(MockResponse::Success(response)) => return Ok(response),
                Some(MockResponse::Error(err)) => return Err(err),
                Some(MockResponse::Delayed(delay, inner)) => {
                    tokio::time::sleep(delay).await;
                    next = Some(*inner);
                }
                None => {
                    return Err(HttpError::Other(format!(
                        "No mock response for {} {}",
                        method, url
                    )))
                }
            }
        }
    }
}

fn key(method: &str, url: &str) -> RouteKey {
    (method.to_ascii_uppercase(), url.to_string())
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.respond("GET", url, headers, None).await
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.respond("POST", url, headers, Some(body.to_string()))
            .await
    }

    async fn put(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.respond("PUT", url, headers, Some(body.to_string()))
            .await
    }

    async fn delete(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.respond("DELETE", url, headers, None).await
    }
}
