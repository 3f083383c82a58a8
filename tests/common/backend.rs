//! In-memory stand-in for the chat backend.
//!
//! Implements `HttpClient` directly, routing each request the way the real
//! server does: ids are assigned server-side, the thread list is newest
//! first, a send stores the user message plus a canned assistant reply and
//! bumps the thread's `updated_at`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::{json, Value};

use kaiwa::traits::{Headers, HttpClient, HttpError, Response};

use super::FAKE_BASE_URL;

#[derive(Debug, Clone)]
struct StoredThread {
    id: String,
    title: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    id: String,
    thread_id: String,
    role: &'static str,
    content: String,
    created_at: NaiveDateTime,
}

#[derive(Debug)]
struct BackendState {
    threads: Vec<StoredThread>,
    messages: Vec<StoredMessage>,
    clock: NaiveDateTime,
    requests: Vec<(String, String)>,
}

/// Cloneable handle; clones share one backend.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let clock = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid start time");
        Self {
            state: Arc::new(Mutex::new(BackendState {
                threads: Vec::new(),
                messages: Vec::new(),
                clock,
                requests: Vec::new(),
            })),
        }
    }

    /// Number of requests served so far.
    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// `(METHOD, path)` of every request served, in order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn thread_count(&self) -> usize {
        self.state.lock().unwrap().threads.len()
    }

    pub fn message_count(&self, thread_id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .count()
    }

    fn handle(&self, method: &str, url: &str, body: &str) -> Response {
        let mut state = self.state.lock().unwrap();
        let path = url.strip_prefix(FAKE_BASE_URL).unwrap_or(url).to_string();
        state.requests.push((method.to_string(), path.clone()));

        let segments: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(|s| urlencoding::decode(s).map(|s| s.into_owned()).unwrap_or_default())
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let body: Value = serde_json::from_str(body).unwrap_or(Value::Null);

        match (method, segments.as_slice()) {
            ("GET", ["health"]) => ok(json!({"status": "ok", "database": "connected"})),
            ("GET", ["threads"]) => {
                let mut threads = state.threads.clone();
                threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                ok(json!({"threads": threads.iter().map(thread_json).collect::<Vec<_>>()}))
            }
            ("POST", ["threads"]) => {
                let title = body["title"].as_str().unwrap_or("New conversation").to_string();
                let now = state.tick();
                let thread = StoredThread {
                    id: uuid::Uuid::new_v4().simple().to_string(),
                    title,
                    created_at: now,
                    updated_at: now,
                };
                state.threads.push(thread.clone());
                respond(201, thread_json(&thread))
            }
            ("GET", ["threads", id]) => match state.thread(id) {
                Some(thread) => ok(thread_json(thread)),
                None => not_found("Thread not found"),
            },
            ("PUT", ["threads", id]) => {
                let Some(title) = body["title"].as_str().filter(|t| !t.is_empty()) else {
                    return respond(400, json!({"error": "Title is required"}));
                };
                let title = title.to_string();
                let now = state.tick();
                match state.threads.iter_mut().find(|t| t.id == *id) {
                    Some(thread) => {
                        thread.title = title;
                        thread.updated_at = now;
                        ok(thread_json(thread))
                    }
                    None => not_found("Thread not found"),
                }
            }
            ("DELETE", ["threads", id]) => {
                if state.thread(id).is_none() {
                    return not_found("Thread not found");
                }
                state.threads.retain(|t| t.id != *id);
                state.messages.retain(|m| m.thread_id != *id);
                ok(json!({"message": "Thread deleted successfully"}))
            }
            ("GET", ["threads", id, "messages"]) => {
                if state.thread(id).is_none() {
                    return not_found("Thread not found");
                }
                let messages: Vec<Value> = state
                    .messages
                    .iter()
                    .filter(|m| m.thread_id == *id)
                    .map(message_json)
                    .collect();
                ok(json!({"messages": messages}))
            }
            ("POST", ["threads", id, "messages"]) => {
                if state.thread(id).is_none() {
                    return not_found("Thread not found");
                }
                let content = body["content"].as_str().unwrap_or_default().trim().to_string();
                if content.is_empty() {
                    return respond(400, json!({"error": "Content cannot be empty"}));
                }
                let user = state.store_message(id, "user", content.clone());
                let assistant =
                    state.store_message(id, "assistant", format!("You said: {}", content));
                let now = state.tick();
                if let Some(thread) = state.threads.iter_mut().find(|t| t.id == *id) {
                    thread.updated_at = now;
                }
                respond(
                    201,
                    json!({
                        "user_message": message_json(&user),
                        "assistant_message": message_json(&assistant)
                    }),
                )
            }
            ("DELETE", ["messages", id]) => {
                let before = state.messages.len();
                state.messages.retain(|m| m.id != *id);
                if state.messages.len() == before {
                    return not_found("Message not found");
                }
                ok(json!({"message": "Message deleted successfully"}))
            }
            _ => not_found("Not found"),
        }
    }
}

impl BackendState {
    /// Advance the server clock by a minute and return the new time.
    fn tick(&mut self) -> NaiveDateTime {
        self.clock += Duration::minutes(1);
        self.clock
    }

    fn thread(&self, id: &str) -> Option<&StoredThread> {
        self.threads.iter().find(|t| t.id == id)
    }

    fn store_message(
        &mut self,
        thread_id: &str,
        role: &'static str,
        content: String,
    ) -> StoredMessage {
        let message = StoredMessage {
            id: uuid::Uuid::new_v4().simple().to_string(),
            thread_id: thread_id.to_string(),
            role,
            content,
            created_at: self.tick(),
        };
        self.messages.push(message.clone());
        message
    }
}

fn timestamp(at: &NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn thread_json(thread: &StoredThread) -> Value {
    json!({
        "id": thread.id,
        "title": thread.title,
        "created_at": timestamp(&thread.created_at),
        "updated_at": timestamp(&thread.updated_at)
    })
}

fn message_json(message: &StoredMessage) -> Value {
    json!({
        "id": message.id,
        "thread_id": message.thread_id,
        "role": message.role,
        "content": message.content,
        "created_at": timestamp(&message.created_at)
    })
}

fn respond(status: u16, body: Value) -> Response {
    Response::json_body(status, &body)
}

fn ok(body: Value) -> Response {
    respond(200, body)
}

fn not_found(error: &str) -> Response {
    respond(404, json!({ "error": error }))
}

#[async_trait]
impl HttpClient for FakeBackend {
    async fn get(&self, url: &str, _headers: &Headers) -> Result<Response, HttpError> {
        Ok(self.handle("GET", url, ""))
    }

    async fn post(&self, url: &str, body: &str, _headers: &Headers) -> Result<Response, HttpError> {
        Ok(self.handle("POST", url, body))
    }

    async fn put(&self, url: &str, body: &str, _headers: &Headers) -> Result<Response, HttpError> {
        Ok(self.handle("PUT", url, body))
    }

    async fn delete(&self, url: &str, _headers: &Headers) -> Result<Response, HttpError> {
        Ok(self.handle("DELETE", url, ""))
    }
}
