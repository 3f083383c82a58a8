//! Chat backend API client.
//!
//! Single point of outbound communication with the backend. Every request
//! carries JSON content headers and is bounded by the configured timeout.
//! Failures (transport errors and non-2xx statuses alike) are logged once
//! here and then returned to the caller untouched.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::adapters::ReqwestHttpClient;
use crate::config::ClientConfig;
use crate::models::{
    CreateThreadRequest, HealthStatus, Message, MessageListResponse, SendMessageRequest,
    SendMessageResponse, Thread, ThreadListResponse, UpdateThreadRequest,
};
use crate::traits::{Headers, HttpClient, HttpError, Response};

/// Error type for API client operations
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, timeout, IO)
    #[error(transparent)]
    Http(#[from] HttpError),
    /// The server answered with a non-2xx status
    #[error("Server error ({status}): {message}")]
    Status { status: u16, message: String },
    /// A request or response body was not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether the request was abandoned because it exceeded the timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Http(err) if err.is_timeout())
    }

    /// HTTP status for server errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Client for the chat backend's REST API.
///
/// Cheap to share: wrap it in an `Arc` and hand it to each store.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client backed by reqwest.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = ReqwestHttpClient::with_timeout(config.timeout)?;
        Ok(Self::with_http(config, Arc::new(http)))
    }

    /// Create a client over any [`HttpClient`] implementation.
    pub fn with_http(config: ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: config.base_url,
            timeout: config.timeout,
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `GET /threads`
    pub async fn list_threads(&self) -> Result<Vec<Thread>, ApiError> {
        let response: ThreadListResponse = self.request_json(Method::Get, "/threads", None).await?;
        Ok(response.threads)
    }

    /// `POST /threads`
    pub async fn create_thread(&self, title: &str) -> Result<Thread, ApiError> {
        let body = encode(&CreateThreadRequest {
            title: title.to_string(),
        })?;
        self.request_json(Method::Post, "/threads", Some(body)).await
    }

    /// `GET /threads/{id}`
    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread, ApiError> {
        let path = format!("/threads/{}", segment(thread_id));
        self.request_json(Method::Get, &path, None).await
    }

    /// `PUT /threads/{id}`
    pub async fn update_thread(&self, thread_id: &str, title: &str) -> Result<Thread, ApiError> {
        let path = format!("/threads/{}", segment(thread_id));
        let body = encode(&UpdateThreadRequest {
            title: title.to_string(),
        })?;
        self.request_json(Method::Put, &path, Some(body)).await
    }

    /// `DELETE /threads/{id}`
    pub async fn delete_thread(&self, thread_id: &str) -> Result<(), ApiError> {
        let path = format!("/threads/{}", segment(thread_id));
        self.request(Method::Delete, &path, None).await.map(drop)
    }

    /// `GET /threads/{id}/messages`
    pub async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>, ApiError> {
        let path = format!("/threads/{}/messages", segment(thread_id));
        let response: MessageListResponse = self.request_json(Method::Get, &path, None).await?;
        Ok(response.messages)
    }

    /// `POST /threads/{id}/messages`. The server persists the user message,
    /// generates the assistant reply, and returns both.
    pub async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<SendMessageResponse, ApiError> {
        let path = format!("/threads/{}/messages", segment(thread_id));
        let body = encode(&SendMessageRequest {
            content: content.to_string(),
        })?;
        self.request_json(Method::Post, &path, Some(body)).await
    }

    /// `DELETE /messages/{id}`
    pub async fn delete_message(&self, message_id: &str) -> Result<(), ApiError> {
        let path = format!("/messages/{}", segment(message_id));
        self.request(Method::Delete, &path, None).await.map(drop)
    }

    /// `GET /health`
    pub async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        self.request_json(Method::Get, "/health", None).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn json_headers() -> Headers {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<T, ApiError> {
        let response = self.request(method, path, body).await?;
        response.json::<T>().map_err(|e| {
            let err = ApiError::Json(e);
            error!(
                method = method.as_str(),
                url = %self.url(path),
                error = %err,
                "API response could not be decoded"
            );
            err
        })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        let result = self.dispatch(method, &url, body.as_deref()).await;

        let outcome = match result {
            Ok(response) if response.is_success() => Ok(response),
            Ok(response) => Err(ApiError::Status {
                status: response.status,
                message: error_message(&response),
            }),
            Err(err) => Err(ApiError::Http(err)),
        };

        if let Err(err) = &outcome {
            error!(
                method = method.as_str(),
                url = %url,
                error = %err,
                "API request failed"
            );
        }
        outcome
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        body: Option<&str>,
    ) -> Result<Response, HttpError> {
        let headers = Self::json_headers();
        let body = body.unwrap_or("");
        let call = async {
            match method {
                Method::Get => self.http.get(url, &headers).await,
                Method::Post => self.http.post(url, body, &headers).await,
                Method::Put => self.http.put(url, body, &headers).await,
                Method::Delete => self.http.delete(url, &headers).await,
            }
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(HttpError::Timeout(format!(
                    "{} {} exceeded {}ms",
                    method.as_str(),
                    url,
                    self.timeout.as_millis()
                )))
            })
    }
}

fn encode<T: Serialize>(body: &T) -> Result<String, ApiError> {
    Ok(serde_json::to_string(body)?)
}

fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

/// Pull a human-readable message out of an error response. The backend
/// answers failures with `{"error": "...", "details": "..."}`.
fn error_message(response: &Response) -> String {
    if let Ok(value) = response.json::<serde_json::Value>() {
        if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
            return match value.get("details").and_then(|v| v.as_str()) {
                Some(details) => format!("{}: {}", message, details),
                None => message.to_string(),
            };
        }
    }

    match response.text() {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => format!("HTTP {}", response.status),
    }
}
