//! Message types for conversations.

use serde::{Deserialize, Serialize};

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The human on the other end of the chat.
    User,
    /// The language model.
    Assistant,
}

impl TurnRole {
    /// Returns the wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message contributed by either party.
///
/// Serializes as `{"role": ..., "content": ...}`, the shape chat-completion
/// servers expect in their `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTurn {
    role: TurnRole,
    content: String,
}

impl MessageTurn {
    /// Creates a new turn.
    #[must_use]
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    /// Creates an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    #[must_use]
    pub fn role(&self) -> TurnRole {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_creation() {
        let turn = MessageTurn::user("Hello!");
        assert_eq!(turn.role(), TurnRole::User);
        assert_eq!(turn.content(), "Hello!");

        let turn = MessageTurn::assistant("Hi.");
        assert_eq!(turn.role(), TurnRole::Assistant);
    }

    #[test]
    fn turn_serializes_as_chat_message() {
        let turn = MessageTurn::assistant("hi there");
        let json = serde_json::to_value(&turn).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"role": "assistant", "content": "hi there"})
        );
    }

    #[test]
    fn content_is_kept_verbatim() {
        let turn = MessageTurn::user("  padded\n");
        assert_eq!(turn.content(), "  padded\n");
    }
}
