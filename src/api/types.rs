//! API request and response types

use crate::transcript::Message;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

/// Current session and its transcript
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub messages: Vec<Message>,
    pub busy: bool,
}

/// Response for a completed turn
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The assistant message that closed the turn
    pub message: Message,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub model: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
