//! Pure state transition function

use super::{Effect, Event, TurnPhase, TurnState};
use crate::formatting::{format_response, progressive_frames};
use thiserror::Error;

/// Prefix of the assistant message recorded when generation fails
pub const APOLOGY_PREFIX: &str = "Sorry, something went wrong: ";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A response is still being generated, wait for it to finish")]
    TurnInProgress,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
/// Blank user text is not rejected here; callers withhold it.
pub fn transition(state: &TurnState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Idle + UserMessage -> Generating
        (TurnState::Idle, Event::UserMessage { text }) => {
            Ok(TransitionResult::new(TurnState::Generating)
                .with_effect(Effect::append_user_message(text.clone()))
                .with_effect(Effect::notify(TurnPhase::UserSubmitted))
                .with_effect(Effect::notify(TurnPhase::Generating))
                .with_effect(Effect::RequestGeneration { prompt: text }))
        }

        (TurnState::Generating, Event::UserMessage { .. }) => {
            Err(TransitionError::TurnInProgress)
        }

        // Generating + success -> render, format, commit -> Idle
        (TurnState::Generating, Event::GenerationSucceeded { text }) => {
            Ok(TransitionResult::new(TurnState::Idle)
                .with_effect(Effect::notify(TurnPhase::Rendering))
                .with_effect(Effect::RenderFrames {
                    frames: progressive_frames(&text),
                })
                .with_effect(Effect::notify(TurnPhase::Formatting))
                .with_effect(Effect::append_assistant_message(format_response(&text).trim()))
                .with_effect(Effect::notify(TurnPhase::Committed)))
        }

        // Generating + failure -> apology message -> Idle
        (TurnState::Generating, Event::GenerationFailed { error }) => {
            Ok(TransitionResult::new(TurnState::Idle)
                .with_effect(Effect::append_assistant_message(format!(
                    "{APOLOGY_PREFIX}{}",
                    error.message
                )))
                .with_effect(Effect::notify_failed(error.kind)))
        }

        (TurnState::Idle, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} while idle"
        ))),
    }
}
