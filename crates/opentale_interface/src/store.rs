//! Durable artifact storage boundary.

use async_trait::async_trait;
use opentale_core::StageIdentifier;
use opentale_error::OpentaleResult;

/// One persisted blob of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ArtifactKey {
    /// World setting, plain text
    #[display("world")]
    World,
    /// Character profiles, plain text
    #[display("characters")]
    Characters,
    /// Raw outline, plain text
    #[display("outline")]
    OutlineText,
    /// Parsed outline records, JSON array of `{chapter_number, title, prompt}`
    #[display("chapters")]
    OutlineChapters,
    /// Content of one chapter, plain text
    #[display("chapter {}", _0)]
    Chapter(u32),
    /// Conversation of a chat stage, JSON array of messages
    #[display("chat {}", _0)]
    ChatHistory(StageIdentifier),
    /// Project metadata, JSON `{topic, chapter_count}`
    #[display("project")]
    Project,
}

/// Plain text / JSON blobs keyed by project.
///
/// Implementations must never expose a partially written blob: a reader
/// sees either the previous contents or the new ones.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Load a blob, `None` if it was never written.
    async fn load(&self, project: &str, key: ArtifactKey) -> OpentaleResult<Option<String>>;

    /// Write a blob, replacing any previous contents.
    async fn save(&self, project: &str, key: ArtifactKey, contents: &str) -> OpentaleResult<()>;

    /// Remove a blob. Removing a missing blob is not an error.
    async fn delete(&self, project: &str, key: ArtifactKey) -> OpentaleResult<()>;

    /// Chapter numbers with stored content, ascending.
    async fn list_chapters(&self, project: &str) -> OpentaleResult<Vec<u32>>;

    /// Remove every blob of a project.
    async fn delete_project(&self, project: &str) -> OpentaleResult<()>;
}
