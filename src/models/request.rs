use serde::{Deserialize, Serialize};

use super::{Message, Thread};

/// Body of `POST /threads`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateThreadRequest {
    pub title: String,
}

/// Body of `PUT /threads/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateThreadRequest {
    pub title: String,
}

/// Body of `POST /threads/{id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Response from `GET /threads`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadListResponse {
    pub threads: Vec<Thread>,
}

/// Response from `GET /threads/{id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
}

/// Response from `POST /threads/{id}/messages`: the persisted user message
/// and the assistant's reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendMessageResponse {
    pub user_message: Message,
    pub assistant_message: Message,
}
