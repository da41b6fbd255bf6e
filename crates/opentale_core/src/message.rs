//! Message types for conversation history.

use crate::Role;
use serde::{Deserialize, Serialize};

/// One turn of a conversation.
///
/// Order within a history is meaningful and is replayed verbatim.
///
/// # Examples
///
/// ```
/// use opentale_core::{ChatMessage, Role};
///
/// let message = ChatMessage::user("Tell me about the harbor city.");
/// assert_eq!(message.role, Role::User);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
