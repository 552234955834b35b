//! Property-based tests for the turn state machine

use super::transition::*;
use super::*;
use crate::llm::{LlmError, LlmErrorKind};
use crate::transcript::{Message, Role, Transcript};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_error_kind() -> impl Strategy<Value = LlmErrorKind> {
    prop_oneof![
        Just(LlmErrorKind::Network),
        Just(LlmErrorKind::Auth),
        Just(LlmErrorKind::Quota),
        Just(LlmErrorKind::InvalidRequest),
        Just(LlmErrorKind::ServerError),
        Just(LlmErrorKind::MalformedResponse),
        Just(LlmErrorKind::Unknown),
    ]
}

fn arb_outcome() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z.* ]{0,60}".prop_map(|text| Event::GenerationSucceeded { text }),
        (arb_error_kind(), "[a-zA-Z ]{1,30}").prop_map(|(kind, message)| {
            Event::GenerationFailed {
                error: LlmError::new(kind, message),
            }
        }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z ]{1,30}".prop_map(|text| Event::UserMessage { text }),
        arb_outcome(),
    ]
}

/// Apply transcript-affecting effects the way the runner does
fn apply(transcript: &mut Transcript, effects: &[Effect]) {
    for effect in effects {
        if let Effect::AppendMessage { role, content } = effect {
            let message = match role {
                Role::User => Message::user(content.clone()),
                Role::Assistant => Message::assistant(content.clone()),
            };
            transcript.append(message);
        }
    }
}

fn appended_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::AppendMessage { .. }))
        .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Any event sequence keeps Idle/Generating consistent with the effects emitted
    #[test]
    fn prop_state_and_effects_agree(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = TurnState::Idle;
        for event in events {
            let before = state.clone();
            match transition(&state, event) {
                Ok(result) => {
                    let requests = result
                        .effects
                        .iter()
                        .filter(|e| matches!(e, Effect::RequestGeneration { .. }))
                        .count();
                    match result.new_state {
                        TurnState::Generating => {
                            prop_assert_eq!(before, TurnState::Idle);
                            prop_assert_eq!(requests, 1);
                        }
                        TurnState::Idle => {
                            prop_assert_eq!(before, TurnState::Generating);
                            prop_assert_eq!(requests, 0);
                        }
                    }
                    // Every accepted event records exactly one message
                    prop_assert_eq!(appended_count(&result.effects), 1);
                    state = result.new_state;
                }
                Err(TransitionError::TurnInProgress) => {
                    prop_assert_eq!(&state, &TurnState::Generating);
                }
                Err(TransitionError::InvalidTransition(_)) => {
                    prop_assert_eq!(&state, &TurnState::Idle);
                }
            }
        }
    }

    // N complete turns grow the transcript to 1 + 2N in alternating order
    #[test]
    fn prop_turns_alternate(
        turns in proptest::collection::vec(("[a-zA-Z ]{1,30}", arb_outcome()), 0..15)
    ) {
        let mut transcript = Transcript::new();
        let mut state = TurnState::Idle;

        for (text, outcome) in &turns {
            let submitted = transition(&state, Event::UserMessage { text: text.clone() }).unwrap();
            apply(&mut transcript, &submitted.effects);
            let finished = transition(&submitted.new_state, outcome.clone()).unwrap();
            apply(&mut transcript, &finished.effects);
            state = finished.new_state;
            prop_assert_eq!(&state, &TurnState::Idle);
        }

        prop_assert_eq!(transcript.len(), 1 + 2 * turns.len());
        for (i, message) in transcript.all().iter().enumerate().skip(1) {
            let expected = if i % 2 == 1 { Role::User } else { Role::Assistant };
            prop_assert_eq!(message.role, expected);
        }
    }

    // Failures always surface as an apology, never as an error
    #[test]
    fn prop_failure_is_apology(kind in arb_error_kind(), message in "[a-zA-Z ]{1,30}") {
        let result = transition(
            &TurnState::Generating,
            Event::GenerationFailed { error: LlmError::new(kind, message.clone()) },
        );
        prop_assert!(result.is_ok());
        let result = result.unwrap();
        let apology = result.effects.iter().find_map(|e| match e {
            Effect::AppendMessage { role: Role::Assistant, content } => Some(content.clone()),
            _ => None,
        });
        prop_assert_eq!(apology, Some(format!("{APOLOGY_PREFIX}{message}")));
        let last_phase_is_failed = matches!(
            result.effects.last(),
            Some(Effect::NotifyPhase { phase: TurnPhase::Failed, .. })
        );
        prop_assert!(last_phase_is_failed);
    }

    // Same input, same output
    #[test]
    fn prop_transition_is_deterministic(event in arb_event(), generating in any::<bool>()) {
        let state = if generating { TurnState::Generating } else { TurnState::Idle };
        let a = transition(&state, event.clone());
        let b = transition(&state, event);
        match (a, b) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.new_state, b.new_state);
                prop_assert_eq!(a.effects, b.effects);
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "outcomes differ"),
        }
    }
}
