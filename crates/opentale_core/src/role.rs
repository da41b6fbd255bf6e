//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Author of a chat message.
///
/// Serializes in lowercase, the form chat-completion services expect.
///
/// # Examples
///
/// ```
/// use opentale_core::Role;
///
/// assert_ne!(Role::User, Role::Assistant);
/// assert_eq!(format!("{}", Role::System), "system");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System messages carry the stage prompt and context
    #[display("system")]
    System,
    /// User messages are from the author
    #[display("user")]
    User,
    /// Assistant messages are from the model
    #[display("assistant")]
    Assistant,
}
