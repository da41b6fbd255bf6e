//! Addressable slots of project state.

use crate::StageIdentifier;

/// The part of project state a stage finalizes into.
///
/// Each finalize writes exactly one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ArtifactSlot {
    /// World setting document
    #[display("world")]
    World,
    /// Character profiles
    #[display("characters")]
    Characters,
    /// Raw outline plus parsed records
    #[display("outline")]
    Outline,
    /// Content of one chapter
    #[display("chapter {}", _0)]
    Chapter(u32),
    /// Conversation history of a chat stage
    #[display("chat {}", _0)]
    Chat(StageIdentifier),
}
