//! Turn executor

use super::SseEvent;
use crate::llm::{self, LlmService};
use crate::session::Session;
use crate::state_machine::{transition, Effect, Event, TransitionError, TurnPhase};
use crate::transcript::{Message, Role};
use std::sync::Arc;
use std::time::Duration;

/// Runs chat turns for any session against one model client
pub struct TurnRunner {
    llm: Arc<dyn LlmService>,
    /// Pause between progressive frames
    render_delay: Duration,
}

impl TurnRunner {
    pub fn new(llm: Arc<dyn LlmService>, render_delay: Duration) -> Self {
        Self { llm, render_delay }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Run one complete turn: record the user text, generate, render, and
    /// commit. Returns the assistant message that closed the turn.
    ///
    /// Model failures never escape; they become the closing apology message.
    /// The only error is a turn already running on this session.
    pub async fn run_turn(
        &self,
        session: &Session,
        text: String,
    ) -> Result<Message, TransitionError> {
        let mut state = session
            .turn
            .try_lock()
            .map_err(|_| TransitionError::TurnInProgress)?;

        tracing::info!(session_id = %session.id, chars = text.len(), "Turn started");

        // Effects may generate follow-up events; process until quiescent
        let mut events_to_process = vec![Event::UserMessage { text }];
        while let Some(event) = events_to_process.pop() {
            let result = transition(&state, event)?;
            *state = result.new_state;

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(session, effect).await {
                    events_to_process.push(generated);
                }
            }
        }

        let closing = session
            .last_message()
            .filter(|m| m.role == Role::Assistant)
            .ok_or_else(|| {
                TransitionError::InvalidTransition("turn ended without a reply".into())
            })?;

        tracing::info!(
            session_id = %session.id,
            messages = session.message_count(),
            "Turn finished"
        );
        Ok(closing)
    }

    async fn execute_effect(&self, session: &Session, effect: Effect) -> Option<Event> {
        match effect {
            Effect::AppendMessage { role, content } => {
                let message = match role {
                    Role::User => Message::user(content),
                    Role::Assistant => Message::assistant(content),
                };
                session.append(message.clone());
                session.broadcast(SseEvent::Message { message });
                None
            }

            Effect::RequestGeneration { prompt } => {
                match llm::generate(self.llm.as_ref(), &prompt).await {
                    Ok(text) => Some(Event::GenerationSucceeded { text }),
                    Err(error) => {
                        tracing::warn!(
                            session_id = %session.id,
                            kind = error.kind.as_str(),
                            error = %error,
                            "Generation failed, replying with apology"
                        );
                        Some(Event::GenerationFailed { error })
                    }
                }
            }

            Effect::RenderFrames { frames } => {
                for (i, frame) in frames.into_iter().enumerate() {
                    if i > 0 && !self.render_delay.is_zero() {
                        tokio::time::sleep(self.render_delay).await;
                    }
                    session.broadcast(SseEvent::Frame { text: frame });
                }
                None
            }

            Effect::NotifyPhase { phase, detail } => {
                tracing::debug!(session_id = %session.id, phase = phase.as_str(), "Turn phase");
                session.broadcast(SseEvent::Phase { phase, detail });
                if phase.is_terminal() {
                    session.broadcast(SseEvent::Phase {
                        phase: TurnPhase::Idle,
                        detail: None,
                    });
                }
                None
            }
        }
    }
}
