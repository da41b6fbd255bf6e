//! Project state shared by every stage.

use crate::outline::parse_with_report;
use opentale_core::{
    ArtifactSlot, ChapterRecord, ChatMessage, ContextSnapshot, OutlineDocument, StageIdentifier,
};
use opentale_error::{
    JsonError, NotFoundError, NotFoundKind, OpentaleResult, ParseFallbackWarning,
};
use opentale_interface::{ArtifactKey, ArtifactStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Project metadata persisted next to the artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ProjectMeta {
    topic: String,
    chapter_count: u32,
}

/// Where a finalized piece of text goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotTarget {
    /// World setting document
    World,
    /// Character profiles
    Characters,
    /// Raw outline; parsed into chapter records on commit
    Outline {
        /// Count used if the outline has no chapter headers
        declared_chapter_count: u32,
    },
    /// Content of an existing chapter record
    Chapter(u32),
    /// Assistant reply that completes a chat turn
    ChatTurn {
        /// Chat stage owning the conversation
        stage: StageIdentifier,
        /// User message the reply answers
        user_turn: String,
    },
}

impl SlotTarget {
    /// The slot this target writes.
    pub fn slot(&self) -> ArtifactSlot {
        match self {
            Self::World => ArtifactSlot::World,
            Self::Characters => ArtifactSlot::Characters,
            Self::Outline { .. } => ArtifactSlot::Outline,
            Self::Chapter(n) => ArtifactSlot::Chapter(*n),
            Self::ChatTurn { stage, .. } => ArtifactSlot::Chat(*stage),
        }
    }
}

/// Durable, snapshot-readable state of one project.
///
/// Every write persists to the backing [`ArtifactStore`] before the in-memory
/// snapshot changes, and the write lock is held across both. Readers get an
/// owned [`ContextSnapshot`] and never observe a half-updated slot.
pub struct ContextStore {
    project: String,
    state: RwLock<ContextSnapshot>,
    backend: Arc<dyn ArtifactStore>,
}

impl std::fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextStore")
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

impl ContextStore {
    /// Empty state for `project`, backed by `backend`.
    pub fn new(project: impl Into<String>, backend: Arc<dyn ArtifactStore>) -> Self {
        Self {
            project: project.into(),
            state: RwLock::new(ContextSnapshot::default()),
            backend,
        }
    }

    /// State for `project`, hydrated from whatever `backend` already holds.
    #[instrument(skip(backend))]
    pub async fn open(project: &str, backend: Arc<dyn ArtifactStore>) -> OpentaleResult<Self> {
        let mut snapshot = ContextSnapshot::default();

        if let Some(json) = backend.load(project, ArtifactKey::Project).await? {
            let meta: ProjectMeta = from_json(ArtifactKey::Project, &json)?;
            snapshot.set_topic(meta.topic);
            snapshot.set_chapter_count(meta.chapter_count);
        }
        if let Some(world) = backend.load(project, ArtifactKey::World).await? {
            snapshot.set_world_theme(world);
        }
        if let Some(characters) = backend.load(project, ArtifactKey::Characters).await? {
            snapshot.set_characters(characters);
        }

        let raw_outline = backend
            .load(project, ArtifactKey::OutlineText)
            .await?
            .unwrap_or_default();
        let records: Vec<ChapterRecord> =
            match backend.load(project, ArtifactKey::OutlineChapters).await? {
                Some(json) => from_json(ArtifactKey::OutlineChapters, &json)?,
                None => Vec::new(),
            };
        snapshot.set_outline(OutlineDocument::new(raw_outline, records));

        for number in backend.list_chapters(project).await? {
            let Some(content) = backend.load(project, ArtifactKey::Chapter(number)).await? else {
                continue;
            };
            if snapshot.set_chapter_content(number, content).is_err() {
                debug!(number, "Ignoring chapter content without an outline record");
            }
        }

        for stage in StageIdentifier::iter() {
            if let Some(json) = backend.load(project, ArtifactKey::ChatHistory(stage)).await? {
                let history: Vec<ChatMessage> = from_json(ArtifactKey::ChatHistory(stage), &json)?;
                snapshot.set_history(stage, history);
            }
        }

        info!(
            chapters = snapshot.chapters().len(),
            has_world = snapshot.has_world_theme(),
            "Opened project"
        );

        Ok(Self {
            project: project.to_string(),
            state: RwLock::new(snapshot),
            backend,
        })
    }

    /// Project name.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Owned copy of the current state.
    pub async fn snapshot(&self) -> ContextSnapshot {
        self.state.read().await.clone()
    }

    /// Record the topic and declared chapter count.
    #[instrument(skip(self, topic), fields(project = %self.project))]
    pub async fn set_project_meta(
        &self,
        topic: &str,
        chapter_count: u32,
    ) -> OpentaleResult<()> {
        let mut state = self.state.write().await;
        let meta = ProjectMeta {
            topic: topic.to_string(),
            chapter_count,
        };
        self.backend
            .save(
                &self.project,
                ArtifactKey::Project,
                &to_json(ArtifactKey::Project, &meta)?,
            )
            .await?;
        state.set_topic(meta.topic);
        state.set_chapter_count(chapter_count);
        Ok(())
    }

    /// Replace the world setting.
    #[instrument(skip(self, text), fields(project = %self.project, len = text.len()))]
    pub async fn write_world(&self, text: &str) -> OpentaleResult<()> {
        let mut state = self.state.write().await;
        self.backend
            .save(&self.project, ArtifactKey::World, text)
            .await?;
        state.set_world_theme(text);
        Ok(())
    }

    /// Replace the character profiles.
    #[instrument(skip(self, text), fields(project = %self.project, len = text.len()))]
    pub async fn write_characters(&self, text: &str) -> OpentaleResult<()> {
        let mut state = self.state.write().await;
        self.backend
            .save(&self.project, ArtifactKey::Characters, text)
            .await?;
        state.set_characters(text);
        Ok(())
    }

    /// Replace the outline and the chapter records parsed from it.
    ///
    /// Returns the parser's fallback report when no chapter headers were
    /// found. Content of chapters whose numbers survive is kept.
    #[instrument(skip(self, text), fields(project = %self.project, len = text.len()))]
    pub async fn write_outline(
        &self,
        text: &str,
        declared_chapter_count: u32,
    ) -> OpentaleResult<Option<ParseFallbackWarning>> {
        let (records, warning) = parse_with_report(text, declared_chapter_count).into_parts();
        let plans: Vec<ChapterRecord> = records.iter().map(ChapterRecord::plan).collect();

        let mut state = self.state.write().await;
        let previous: Vec<ChapterRecord> =
            state.outline().parsed().iter().map(ChapterRecord::plan).collect();

        // Records go first so a failed text write can be undone.
        self.backend
            .save(
                &self.project,
                ArtifactKey::OutlineChapters,
                &to_json(ArtifactKey::OutlineChapters, &plans)?,
            )
            .await?;
        if let Err(e) = self
            .backend
            .save(&self.project, ArtifactKey::OutlineText, text)
            .await
        {
            self.restore_outline_records(&previous).await;
            return Err(e);
        }
        state.set_outline(OutlineDocument::new(text, records));

        info!(chapters = plans.len(), fallback = warning.is_some(), "Outline stored");
        Ok(warning)
    }

    async fn restore_outline_records(&self, previous: &[ChapterRecord]) {
        let restored = if previous.is_empty() {
            self.backend
                .delete(&self.project, ArtifactKey::OutlineChapters)
                .await
        } else {
            match to_json(ArtifactKey::OutlineChapters, &previous) {
                Ok(json) => {
                    self.backend
                        .save(&self.project, ArtifactKey::OutlineChapters, &json)
                        .await
                }
                Err(e) => Err(e.into()),
            }
        };
        if let Err(e) = restored {
            warn!(error = %e, "Could not restore chapter records after a failed outline write");
        }
    }

    /// Re-parse the stored raw outline and replace the chapter records.
    ///
    /// # Errors
    ///
    /// `NotFoundError` if no outline text has been stored.
    pub async fn reparse_outline(
        &self,
        declared_chapter_count: u32,
    ) -> OpentaleResult<Option<ParseFallbackWarning>> {
        let raw = self.state.read().await.outline().raw_text().clone();
        if raw.trim().is_empty() {
            return Err(NotFoundError::new(NotFoundKind::Outline).into());
        }
        self.write_outline(&raw, declared_chapter_count).await
    }

    /// Replace the content of chapter `number`.
    ///
    /// # Errors
    ///
    /// `NotFoundError` if the outline has no record for `number`.
    #[instrument(skip(self, text), fields(project = %self.project, len = text.len()))]
    pub async fn write_chapter(&self, number: u32, text: &str) -> OpentaleResult<()> {
        let mut state = self.state.write().await;
        state.chapter(number)?;
        self.backend
            .save(&self.project, ArtifactKey::Chapter(number), text)
            .await?;
        state.set_chapter_content(number, text)?;
        Ok(())
    }

    /// Append a completed exchange to a chat stage's conversation.
    #[instrument(skip(self, user_turn, reply), fields(project = %self.project))]
    pub async fn append_chat_turn(
        &self,
        stage: StageIdentifier,
        user_turn: &str,
        reply: &str,
    ) -> OpentaleResult<()> {
        let mut state = self.state.write().await;
        let mut updated = state.clone();
        updated.push_chat_turn(stage, user_turn, reply);
        let key = ArtifactKey::ChatHistory(stage);
        self.backend
            .save(&self.project, key, &to_json(key, updated.history(stage))?)
            .await?;
        *state = updated;
        Ok(())
    }

    /// Write finalized text into the slot named by `target`.
    pub async fn commit(
        &self,
        target: &SlotTarget,
        text: &str,
    ) -> OpentaleResult<Option<ParseFallbackWarning>> {
        match target {
            SlotTarget::World => self.write_world(text).await.map(|_| None),
            SlotTarget::Characters => self.write_characters(text).await.map(|_| None),
            SlotTarget::Outline {
                declared_chapter_count,
            } => self.write_outline(text, *declared_chapter_count).await,
            SlotTarget::Chapter(n) => self.write_chapter(*n, text).await.map(|_| None),
            SlotTarget::ChatTurn { stage, user_turn } => self
                .append_chat_turn(*stage, user_turn, text)
                .await
                .map(|_| None),
        }
    }

    /// Drop every artifact of the project and start empty.
    #[instrument(skip(self), fields(project = %self.project))]
    pub async fn reset(&self) -> OpentaleResult<()> {
        let mut state = self.state.write().await;
        self.backend.delete_project(&self.project).await?;
        *state = ContextSnapshot::default();
        info!("Project reset");
        Ok(())
    }
}

fn to_json<T: Serialize + ?Sized>(key: ArtifactKey, value: &T) -> Result<String, JsonError> {
    serde_json::to_string_pretty(value).map_err(|e| JsonError::new(key, e.to_string()))
}

fn from_json<T: for<'de> Deserialize<'de>>(key: ArtifactKey, json: &str) -> Result<T, JsonError> {
    serde_json::from_str(json).map_err(|e| JsonError::new(key, e.to_string()))
}
