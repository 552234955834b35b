//! Effects produced by state transitions

use super::TurnPhase;
use crate::llm::LlmErrorKind;
use crate::transcript::Role;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message to the session transcript
    AppendMessage { role: Role, content: String },

    /// Call the model with the user's prompt
    RequestGeneration { prompt: String },

    /// Send progressive display frames to connected clients
    RenderFrames { frames: Vec<String> },

    /// Tell connected clients which phase the turn is in
    NotifyPhase {
        phase: TurnPhase,
        detail: Option<String>,
    },
}

impl Effect {
    pub fn append_user_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn append_assistant_message(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn notify(phase: TurnPhase) -> Self {
        Effect::NotifyPhase {
            phase,
            detail: None,
        }
    }

    pub fn notify_failed(kind: LlmErrorKind) -> Self {
        Effect::NotifyPhase {
            phase: TurnPhase::Failed,
            detail: Some(kind.as_str().to_string()),
        }
    }
}
