//! Chat transcript value objects

use std::fmt;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Get the wire-format role string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in the chat transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    /// Set when the reply was produced by the extended-reasoning tier
    pub thoughtful: bool,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            thoughtful: false,
        }
    }

    /// Create a model reply
    pub fn model(text: impl Into<String>, thoughtful: bool) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            thoughtful,
        }
    }
}

/// Append-only, in-memory chat transcript. Never persisted.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, preserving arrival order
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Get all messages in append order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Reset the transcript to empty
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Model.as_str(), "model");
    }

    #[test]
    fn user_message_is_not_thoughtful() {
        let msg = ChatMessage::user("hi");
        assert_eq!(msg.role, Role::User);
        assert!(!msg.thoughtful);
    }

    #[test]
    fn model_message_carries_flag() {
        let msg = ChatMessage::model("reply", true);
        assert_eq!(msg.role, Role::Model);
        assert!(msg.thoughtful);
    }

    #[test]
    fn transcript_preserves_order() {
        let mut t = Transcript::new();
        t.push(ChatMessage::user("one"));
        t.push(ChatMessage::model("two", false));
        t.push(ChatMessage::user("three"));

        let texts: Vec<&str> = t.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn transcript_clear() {
        let mut t = Transcript::new();
        t.push(ChatMessage::user("one"));
        assert!(!t.is_empty());
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
    }
}
