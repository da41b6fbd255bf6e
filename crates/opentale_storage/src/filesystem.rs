//! Filesystem-based artifact storage.
//!
//! Each project is a directory under the base path:
//!
//! ```text
//! book_output/
//! └── harbor/
//!     ├── project.json
//!     ├── world.txt
//!     ├── characters.txt
//!     ├── outline.txt
//!     ├── chapters.json
//!     ├── chapters/
//!     │   ├── chapter_1.txt
//!     │   └── chapter_2.txt
//!     └── chat/
//!         └── world_builder_chat.json
//! ```

use crate::validate_project;
use opentale_error::{OpentaleResult, StorageError, StorageErrorKind};
use opentale_interface::{ArtifactKey, ArtifactStore};
use std::path::{Path, PathBuf};

/// Filesystem storage backend.
///
/// Writes go to a temp file next to the target and are renamed into place,
/// so a reader never sees a half-written artifact.
#[derive(Debug, Clone)]
pub struct FileSystemArtifactStore {
    base_path: PathBuf,
}

impl FileSystemArtifactStore {
    /// Create a new filesystem store rooted at `base_path`.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> OpentaleResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation {
                path: base_path.display().to_string(),
                reason: e.to_string(),
            })
        })?;

        tracing::debug!(path = %base_path.display(), "Opened filesystem artifact store");
        Ok(Self { base_path })
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory holding one project's artifacts.
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.base_path.join(project)
    }

    /// Path of one artifact.
    pub fn path_for(&self, project: &str, key: ArtifactKey) -> PathBuf {
        let dir = self.project_dir(project);
        match key {
            ArtifactKey::World => dir.join("world.txt"),
            ArtifactKey::Characters => dir.join("characters.txt"),
            ArtifactKey::OutlineText => dir.join("outline.txt"),
            ArtifactKey::OutlineChapters => dir.join("chapters.json"),
            ArtifactKey::Chapter(n) => dir.join("chapters").join(format!("chapter_{}.txt", n)),
            ArtifactKey::ChatHistory(stage) => {
                dir.join("chat").join(format!("{}.json", stage.as_str()))
            }
            ArtifactKey::Project => dir.join("project.json"),
        }
    }

    fn chapter_number(file_name: &str) -> Option<u32> {
        file_name
            .strip_prefix("chapter_")?
            .strip_suffix(".txt")?
            .parse()
            .ok()
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FileSystemArtifactStore {
    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn load(&self, project: &str, key: ArtifactKey) -> OpentaleResult<Option<String>> {
        validate_project(project)?;
        let path = self.path_for(project, key);

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), bytes = contents.len(), "Loaded artifact");
                Ok(Some(contents))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::new(StorageErrorKind::FileRead {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
            .into()),
        }
    }

    #[tracing::instrument(skip(self, contents), fields(key = %key, bytes = contents.len()))]
    async fn save(&self, project: &str, key: ArtifactKey, contents: &str) -> OpentaleResult<()> {
        validate_project(project)?;
        let path = self.path_for(project, key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation {
                    path: parent.display().to_string(),
                    reason: e.to_string(),
                })
            })?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, contents).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite {
                path: temp_path.display().to_string(),
                reason: e.to_string(),
            })
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite {
                path: path.display().to_string(),
                reason: format!("rename from {}: {}", temp_path.display(), e),
            })
        })?;

        tracing::info!(path = %path.display(), bytes = contents.len(), "Saved artifact");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn delete(&self, project: &str, key: ArtifactKey) -> OpentaleResult<()> {
        validate_project(project)?;
        let path = self.path_for(project, key);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Deleted artifact");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(StorageErrorKind::Delete {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
            .into()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list_chapters(&self, project: &str) -> OpentaleResult<Vec<u32>> {
        validate_project(project)?;
        let dir = self.project_dir(project).join("chapters");

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead {
                    path: dir.display().to_string(),
                    reason: e.to_string(),
                })
                .into());
            }
        };

        let mut numbers = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead {
                    path: dir.display().to_string(),
                    reason: e.to_string(),
                })
            })?;
            let Some(entry) = entry else { break };
            if let Some(number) = entry.file_name().to_str().and_then(Self::chapter_number) {
                numbers.push(number);
            }
        }
        numbers.sort_unstable();

        tracing::debug!(count = numbers.len(), "Listed chapters");
        Ok(numbers)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_project(&self, project: &str) -> OpentaleResult<()> {
        validate_project(project)?;
        let dir = self.project_dir(project);

        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!(path = %dir.display(), "Deleted project");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(StorageErrorKind::Delete {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_file_names() {
        assert_eq!(FileSystemArtifactStore::chapter_number("chapter_12.txt"), Some(12));
        assert_eq!(FileSystemArtifactStore::chapter_number("chapter_x.txt"), None);
        assert_eq!(FileSystemArtifactStore::chapter_number("chapter_3.tmp"), None);
    }
}
