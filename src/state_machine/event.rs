//! Events that can occur during a turn

use crate::llm::LlmError;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage { text: String },

    // LLM events
    GenerationSucceeded { text: String },
    GenerationFailed { error: LlmError },
}
