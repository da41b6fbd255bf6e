//! Per-chapter drafting and editing.

use crate::aggregator::{StageOutput, StreamAggregator, StreamOutcome};
use crate::context::{ContextStore, SlotTarget};
use crate::normalize::NewlinePolicy;
use crate::orchestrator::StageOrchestrator;
use crate::prompts::{ChapterBrief, chapter_editing_prompt, chapter_generation_prompt};
use opentale_core::{ArtifactSlot, ContextSnapshot, GenerationRequest, StageIdentifier, StreamEvent};
use opentale_error::{MissingPrerequisiteError, OpentaleResult, Prerequisite};
use opentale_interface::Streaming;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Characters of the previous chapter handed to the writer.
pub const PREVIOUS_CONTEXT_CHARS: usize = 1000;

/// Trailing slice of chapter `number - 1`, empty if it has no content.
///
/// # Examples
///
/// ```
/// use opentale_core::{ChapterRecord, ContextSnapshot, OutlineDocument};
/// use opentale_pipeline::previous_context;
///
/// let mut snapshot = ContextSnapshot::default();
/// snapshot.set_outline(OutlineDocument::new(
///     "",
///     vec![ChapterRecord::new(1, "One", ""), ChapterRecord::new(2, "Two", "")],
/// ));
/// snapshot.set_chapter_content(1, "x".repeat(1500)).unwrap();
///
/// assert_eq!(previous_context(&snapshot, 2).len(), 1000);
/// assert_eq!(previous_context(&snapshot, 1), "");
/// ```
pub fn previous_context(snapshot: &ContextSnapshot, number: u32) -> String {
    let Some(previous) = number.checked_sub(1) else {
        return String::new();
    };
    let Some(content) = snapshot
        .chapters()
        .get(&previous)
        .and_then(|record| record.content().as_deref())
    else {
        return String::new();
    };

    let skip = content.chars().count().saturating_sub(PREVIOUS_CONTEXT_CHARS);
    content.chars().skip(skip).collect()
}

/// Drafts chapters with the writer stage and revises them with the editor.
#[derive(Clone)]
pub struct ChapterPipeline {
    orchestrator: Arc<StageOrchestrator>,
    service: Arc<dyn Streaming>,
    store: Arc<ContextStore>,
    aggregator: StreamAggregator,
}

impl std::fmt::Debug for ChapterPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChapterPipeline")
            .field("model", &self.service.model_name())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ChapterPipeline {
    /// Pipeline writing into `store` through `service`.
    pub fn new(
        orchestrator: Arc<StageOrchestrator>,
        service: Arc<dyn Streaming>,
        store: Arc<ContextStore>,
    ) -> Self {
        let aggregator = StreamAggregator::new(store.clone());
        Self {
            orchestrator,
            service,
            store,
            aggregator,
        }
    }

    fn brief(&self, number: u32, snapshot: &ContextSnapshot, outline: String) -> ChapterBrief {
        let title = snapshot
            .chapters()
            .get(&number)
            .map(|record| record.title().clone())
            .unwrap_or_default();
        ChapterBrief {
            number,
            title,
            outline,
            world_theme: snapshot.world_theme().clone(),
            characters: snapshot.characters().clone(),
            scene_details: String::new(),
            previous_context: previous_context(snapshot, number),
        }
    }

    /// The writer request for chapter `number`.
    ///
    /// `additional` author notes are appended to the chapter's outline prompt.
    ///
    /// # Errors
    ///
    /// `NotFoundError` if the snapshot has no record for `number`.
    pub fn writer_request(
        &self,
        number: u32,
        snapshot: &ContextSnapshot,
        additional: Option<&str>,
    ) -> OpentaleResult<GenerationRequest> {
        let record = snapshot.chapter(number)?;
        let outline = match additional.map(str::trim).filter(|notes| !notes.is_empty()) {
            Some(notes) => format!("{}\n\n{}", record.prompt(), notes),
            None => record.prompt().clone(),
        };
        let prompt = chapter_generation_prompt(&self.brief(number, snapshot, outline));
        self.orchestrator
            .build(StageIdentifier::Writer, snapshot, &[], &prompt)
    }

    /// Draft chapter `number` and store its content.
    #[instrument(skip(self, snapshot, additional), fields(project = self.store.project()))]
    pub async fn generate(
        &self,
        number: u32,
        snapshot: &ContextSnapshot,
        additional: Option<&str>,
    ) -> OpentaleResult<StageOutput> {
        let request = self.writer_request(number, snapshot, additional)?;
        let reply = self.orchestrator.run(&*self.service, &request).await?;
        let text = NewlinePolicy::for_slot(ArtifactSlot::Chapter(number)).apply(&reply);
        self.store.write_chapter(number, &text).await?;
        info!(len = text.len(), "Chapter drafted");
        Ok(StageOutput::new(text))
    }

    /// Draft chapter `number`, streaming deltas to `sink`.
    ///
    /// Streamed text is stored as received, after normalization.
    #[instrument(skip(self, snapshot, additional, sink, cancel), fields(project = self.store.project()))]
    pub async fn generate_stream(
        &self,
        number: u32,
        snapshot: &ContextSnapshot,
        additional: Option<&str>,
        sink: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> OpentaleResult<StreamOutcome> {
        let request = self
            .writer_request(number, snapshot, additional)?
            .into_streaming();
        let opening = self.orchestrator.open_stream(&*self.service, &request);
        self.aggregator
            .run(opening, SlotTarget::Chapter(number), sink, cancel)
            .await
    }

    /// Revise the stored content of chapter `number` with the editor stage.
    ///
    /// # Errors
    ///
    /// `NotFoundError` if there is no record for `number`,
    /// `MissingPrerequisiteError` if it has no content yet.
    #[instrument(skip(self, snapshot), fields(project = self.store.project()))]
    pub async fn edit(&self, number: u32, snapshot: &ContextSnapshot) -> OpentaleResult<StageOutput> {
        let record = snapshot.chapter(number)?;
        let content = record.content().as_deref().ok_or_else(|| {
            MissingPrerequisiteError::new(
                StageIdentifier::Editor.as_str(),
                Prerequisite::ChapterContent(number),
            )
        })?;

        let brief = self.brief(number, snapshot, record.prompt().clone());
        let prompt = chapter_editing_prompt(content, &brief);
        let request = self
            .orchestrator
            .build(StageIdentifier::Editor, snapshot, &[], &prompt)?;

        let reply = self.orchestrator.run(&*self.service, &request).await?;
        let text = NewlinePolicy::for_slot(ArtifactSlot::Chapter(number)).apply(&reply);
        self.store.write_chapter(number, &text).await?;
        info!(len = text.len(), "Chapter edited");
        Ok(StageOutput::new(text))
    }
}
