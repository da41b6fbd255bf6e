//! Project artifact storage for OpenTale.
//!
//! Backends persist the plain text and JSON blobs that make up a writing
//! project: world setting, characters, outline, chapters and chat history.
//!
//! # Example
//!
//! ```rust
//! use opentale_interface::{ArtifactKey, ArtifactStore};
//! use opentale_storage::FileSystemArtifactStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileSystemArtifactStore::new("/tmp/book_output")?;
//!
//! store.save("harbor", ArtifactKey::World, "WORLD_ELEMENTS:\n\nFog.").await?;
//! let world = store.load("harbor", ArtifactKey::World).await?;
//! assert_eq!(world.as_deref(), Some("WORLD_ELEMENTS:\n\nFog."));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod memory;

pub use filesystem::FileSystemArtifactStore;
pub use memory::InMemoryArtifactStore;
pub use opentale_error::{StorageError, StorageErrorKind};

/// Rejects project names that are empty or would leave the output directory.
pub(crate) fn validate_project(project: &str) -> Result<(), StorageError> {
    let invalid = project.trim().is_empty()
        || project.starts_with('.')
        || project.contains(['/', '\\'])
        || project.contains("..");
    if invalid {
        return Err(StorageError::new(StorageErrorKind::InvalidProject(
            project.to_string(),
        )));
    }
    Ok(())
}
