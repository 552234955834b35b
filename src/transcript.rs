//! Session transcript: the ordered, append-only log of chat messages

use crate::markdown;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// First message of every transcript
pub const GREETING: &str = "Hello! How can I assist you today?";

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// `content` rendered as markdown, for display
    pub html: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            role,
            html: markdown::to_html(&content),
            content,
            created_at: Utc::now(),
        }
    }
}

/// Ordered log of messages for one session.
///
/// Entries are never removed or edited; `all()` is display order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create a transcript seeded with the greeting.
    pub fn new() -> Self {
        let mut transcript = Self::default();
        transcript.initialize();
        transcript
    }

    /// Seed with the greeting if nothing has been recorded yet.
    pub fn initialize(&mut self) {
        if self.messages.is_empty() {
            self.messages.push(Message::assistant(GREETING));
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_starts_with_greeting() {
        let transcript = Transcript::new();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.all()[0].role, Role::Assistant);
        assert_eq!(transcript.all()[0].content, "Hello! How can I assist you today?");
    }

    #[test]
    fn test_initialize_is_noop_when_populated() {
        let mut transcript = Transcript::new();
        transcript.append(Message::user("hi"));
        transcript.initialize();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().unwrap().content, "hi");
    }

    #[test]
    fn test_all_is_repeatable() {
        let mut transcript = Transcript::new();
        transcript.append(Message::user("a"));
        let first = transcript.all().to_vec();
        let second = transcript.all().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_value(Message::user("x")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "x");
        assert_eq!(json["html"], "<p>x</p>\n");
        assert!(json["created_at"].is_string());
    }

    proptest! {
        #[test]
        fn prop_pairs_append_in_order(
            pairs in proptest::collection::vec(("[a-z ]{0,12}", "[a-z ]{0,12}"), 0..20)
        ) {
            let mut transcript = Transcript::new();
            for (question, answer) in &pairs {
                transcript.append(Message::user(question.clone()));
                transcript.append(Message::assistant(answer.clone()));
            }

            prop_assert_eq!(transcript.len(), 1 + 2 * pairs.len());
            prop_assert_eq!(&transcript.all()[0].content, GREETING);
            for (i, (question, answer)) in pairs.iter().enumerate() {
                let user = &transcript.all()[1 + 2 * i];
                let assistant = &transcript.all()[2 + 2 * i];
                prop_assert_eq!(user.role, Role::User);
                prop_assert_eq!(&user.content, question);
                prop_assert_eq!(assistant.role, Role::Assistant);
                prop_assert_eq!(&assistant.content, answer);
            }
        }
    }
}
