//! In-memory artifact storage.
//!
//! Useful for tests and for sessions that should leave nothing on disk.

use crate::validate_project;
use async_trait::async_trait;
use opentale_error::OpentaleResult;
use opentale_interface::{ArtifactKey, ArtifactStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory store keyed by project and artifact.
///
/// Clones share the same underlying map. All data is lost when the last
/// clone is dropped.
///
/// # Example
/// ```
/// use opentale_interface::{ArtifactKey, ArtifactStore};
/// use opentale_storage::InMemoryArtifactStore;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = InMemoryArtifactStore::new();
/// store.save("demo", ArtifactKey::Characters, "CHARACTER_PROFILES:").await.unwrap();
/// assert_eq!(store.len().await, 1);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifactStore {
    artifacts: Arc<RwLock<HashMap<(String, ArtifactKey), String>>>,
}

impl InMemoryArtifactStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts across all projects.
    pub async fn len(&self) -> usize {
        self.artifacts.read().await.len()
    }

    /// Whether nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.artifacts.read().await.is_empty()
    }

    /// Keys stored for `project`.
    pub async fn keys(&self, project: &str) -> Vec<ArtifactKey> {
        self.artifacts
            .read()
            .await
            .keys()
            .filter(|(name, _)| name == project)
            .map(|(_, key)| *key)
            .collect()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn load(&self, project: &str, key: ArtifactKey) -> OpentaleResult<Option<String>> {
        validate_project(project)?;
        let artifacts = self.artifacts.read().await;
        Ok(artifacts.get(&(project.to_string(), key)).cloned())
    }

    async fn save(&self, project: &str, key: ArtifactKey, contents: &str) -> OpentaleResult<()> {
        validate_project(project)?;
        let mut artifacts = self.artifacts.write().await;
        artifacts.insert((project.to_string(), key), contents.to_string());
        tracing::debug!(project, key = %key, bytes = contents.len(), "Saved artifact in memory");
        Ok(())
    }

    async fn delete(&self, project: &str, key: ArtifactKey) -> OpentaleResult<()> {
        validate_project(project)?;
        self.artifacts
            .write()
            .await
            .remove(&(project.to_string(), key));
        Ok(())
    }

    async fn list_chapters(&self, project: &str) -> OpentaleResult<Vec<u32>> {
        validate_project(project)?;
        let artifacts = self.artifacts.read().await;
        let mut numbers: Vec<u32> = artifacts
            .keys()
            .filter_map(|(name, key)| match key {
                ArtifactKey::Chapter(n) if name == project => Some(*n),
                _ => None,
            })
            .collect();
        numbers.sort_unstable();
        Ok(numbers)
    }

    async fn delete_project(&self, project: &str) -> OpentaleResult<()> {
        validate_project(project)?;
        self.artifacts
            .write()
            .await
            .retain(|(name, _), _| name != project);
        Ok(())
    }
}
