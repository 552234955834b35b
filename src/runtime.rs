//! Runtime for executing chat turns
//!
//! The state machine decides what happens; this module performs the
//! effects against a session and the model client.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::TurnRunner;

use crate::state_machine::TurnPhase;
use crate::transcript::Message;
use uuid::Uuid;

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        session_id: Uuid,
        messages: Vec<Message>,
        phase: TurnPhase,
    },
    /// A message was appended to the transcript
    Message { message: Message },
    Phase {
        phase: TurnPhase,
        detail: Option<String>,
    },
    /// Progressive display of a response; not part of the transcript
    Frame { text: String },
}
