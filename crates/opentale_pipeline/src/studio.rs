//! End-to-end workflows: world, characters, outline, chapters.
//!
//! [`Studio`] sequences the pipeline for one project. Every generation step
//! comes in a direct and a streaming form; each writes exactly the slot of
//! its stage.

use crate::aggregator::{StageOutput, StreamAggregator, StreamOutcome};
use crate::chapter::ChapterPipeline;
use crate::context::{ContextStore, SlotTarget};
use crate::normalize::{NewlinePolicy, normalize_manual_edit};
use crate::orchestrator::StageOrchestrator;
use crate::prompts;
use opentale_core::{ContextSnapshot, GenerationRequest, StageIdentifier, StreamEvent};
use opentale_error::{
    BuilderError, BuilderErrorKind, ConfigurationError, ConfigurationErrorKind, OpentaleResult,
};
use opentale_interface::Streaming;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

const WORLD_HEADER: &str = "WORLD_ELEMENTS:";

/// Project-level knobs for the workflows.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters, derive_builder::Builder)]
#[builder(build_fn(private, name = "build_internal"))]
pub struct StudioSettings {
    /// Temperature used when finalizing an outline
    #[builder(default = "0.6")]
    outline_temperature: f32,
    /// Characters requested when none is given
    #[builder(default = "3")]
    character_count: u32,
    /// Chapters assumed when the project declares none
    #[builder(default = "10")]
    chapter_count: u32,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            outline_temperature: 0.6,
            character_count: 3,
            chapter_count: 10,
        }
    }
}

impl StudioSettings {
    /// Creates a new settings builder.
    pub fn builder() -> StudioSettingsBuilder {
        StudioSettingsBuilder::default()
    }
}

impl StudioSettingsBuilder {
    /// Build the StudioSettings.
    ///
    /// # Errors
    ///
    /// Returns error if a count is zero.
    pub fn build(&self) -> Result<StudioSettings, BuilderError> {
        let settings = self
            .build_internal()
            .map_err(|e| BuilderError::incomplete("studio settings", e))?;
        if settings.character_count == 0 || settings.chapter_count == 0 {
            return Err(BuilderError::new(BuilderErrorKind::InvalidSettings(
                "character_count and chapter_count must be positive".to_string(),
            )));
        }
        Ok(settings)
    }
}

/// Stage workflows for one project.
pub struct Studio {
    orchestrator: Arc<StageOrchestrator>,
    service: Arc<dyn Streaming>,
    store: Arc<ContextStore>,
    aggregator: StreamAggregator,
    chapters: ChapterPipeline,
    settings: StudioSettings,
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("store", &self.store)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Studio {
    /// Workflows over `store`, generating through `service`.
    pub fn new(
        orchestrator: StageOrchestrator,
        service: Arc<dyn Streaming>,
        store: Arc<ContextStore>,
        settings: StudioSettings,
    ) -> Self {
        let orchestrator = Arc::new(orchestrator);
        let chapters = ChapterPipeline::new(orchestrator.clone(), service.clone(), store.clone());
        Self {
            aggregator: StreamAggregator::new(store.clone()),
            orchestrator,
            service,
            store,
            chapters,
            settings,
        }
    }

    /// Backing project state.
    pub fn store(&self) -> &Arc<ContextStore> {
        &self.store
    }

    /// Per-chapter pipeline.
    pub fn chapters(&self) -> &ChapterPipeline {
        &self.chapters
    }

    /// Current project state.
    pub async fn snapshot(&self) -> ContextSnapshot {
        self.store.snapshot().await
    }

    /// Record the topic and declared chapter count of the project.
    pub async fn begin(&self, topic: &str, chapter_count: u32) -> OpentaleResult<()> {
        self.store.set_project_meta(topic, chapter_count).await
    }

    fn declared_chapters(&self, snapshot: &ContextSnapshot) -> u32 {
        match *snapshot.chapter_count() {
            0 => self.settings.chapter_count,
            n => n,
        }
    }

    /// `snapshot` with its chapter count set to `declared`.
    fn with_declared_chapters(
        &self,
        snapshot: &ContextSnapshot,
        declared: u32,
    ) -> ContextSnapshot {
        let mut resolved = snapshot.clone();
        resolved.set_chapter_count(declared);
        resolved
    }

    async fn direct(
        &self,
        request: &GenerationRequest,
        target: SlotTarget,
    ) -> OpentaleResult<StageOutput> {
        let reply = self.orchestrator.run(&*self.service, request).await?;
        self.finish(reply, target).await
    }

    async fn finish(&self, reply: String, target: SlotTarget) -> OpentaleResult<StageOutput> {
        let text = NewlinePolicy::for_slot(target.slot()).apply(&reply);
        let warning = self.store.commit(&target, &text).await?;
        info!(slot = %target.slot(), len = text.len(), "Slot written");
        Ok(StageOutput::with_warning(text, warning))
    }

    async fn streamed(
        &self,
        request: GenerationRequest,
        target: SlotTarget,
        sink: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> OpentaleResult<StreamOutcome> {
        let request = request.into_streaming();
        let opening = self.orchestrator.open_stream(&*self.service, &request);
        self.aggregator.run(opening, target, sink, cancel).await
    }

    // World

    fn world_request(&self, snapshot: &ContextSnapshot) -> OpentaleResult<GenerationRequest> {
        let prompt = prompts::world_theme_prompt(snapshot.topic());
        self.orchestrator
            .build(StageIdentifier::WorldBuilder, snapshot, &[], &prompt)
    }

    fn finalize_world_request(
        &self,
        snapshot: &ContextSnapshot,
    ) -> OpentaleResult<GenerationRequest> {
        let prompt = prompts::finalize_world_prompt(snapshot.topic());
        self.orchestrator.build(
            StageIdentifier::WorldBuilder,
            snapshot,
            snapshot.history(StageIdentifier::WorldBuilderChat),
            &prompt,
        )
    }

    /// Generate the world setting from the project topic.
    #[instrument(skip(self), fields(project = self.store.project()))]
    pub async fn generate_world(&self) -> OpentaleResult<StageOutput> {
        let snapshot = self.snapshot().await;
        let request = self.world_request(&snapshot)?;
        self.direct(&request, SlotTarget::World).await
    }

    /// Streaming form of [`Studio::generate_world`].
    pub async fn generate_world_stream(
        &self,
        sink: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> OpentaleResult<StreamOutcome> {
        let snapshot = self.snapshot().await;
        let request = self.world_request(&snapshot)?;
        self.streamed(request, SlotTarget::World, sink, cancel).await
    }

    /// Brief, non-persisted overview of directions the world could take.
    #[instrument(skip(self), fields(project = self.store.project()))]
    pub async fn suggest_world(&self) -> OpentaleResult<String> {
        let snapshot = self.snapshot().await;
        let prompt = prompts::world_suggestions_prompt(snapshot.topic());
        let request =
            self.orchestrator
                .build(StageIdentifier::WorldBuilderChat, &snapshot, &[], &prompt)?;
        self.orchestrator.run_verbatim(&*self.service, &request).await
    }

    /// Turn the world-building conversation into the final world document.
    ///
    /// The stored document always starts with the `WORLD_ELEMENTS:` header.
    #[instrument(skip(self), fields(project = self.store.project()))]
    pub async fn finalize_world(&self) -> OpentaleResult<StageOutput> {
        let snapshot = self.snapshot().await;
        let request = self.finalize_world_request(&snapshot)?;
        let reply = self.orchestrator.run(&*self.service, &request).await?;
        let reply = if reply.contains(WORLD_HEADER) {
            reply
        } else {
            format!("{}\n\n{}", WORLD_HEADER, reply)
        };
        self.finish(reply, SlotTarget::World).await
    }

    /// Streaming form of [`Studio::finalize_world`]; the text is stored as streamed.
    pub async fn finalize_world_stream(
        &self,
        sink: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> OpentaleResult<StreamOutcome> {
        let snapshot = self.snapshot().await;
        let request = self.finalize_world_request(&snapshot)?;
        self.streamed(request, SlotTarget::World, sink, cancel).await
    }

    // Chat

    fn chat_request(
        &self,
        stage: StageIdentifier,
        snapshot: &ContextSnapshot,
        message: &str,
    ) -> OpentaleResult<GenerationRequest> {
        if !Self::is_chat_stage(stage) {
            return Err(ConfigurationError::new(ConfigurationErrorKind::NotChatStage(
                stage.to_string(),
            ))
            .into());
        }
        let snapshot = self.with_declared_chapters(snapshot, self.declared_chapters(snapshot));
        self.orchestrator
            .build(stage, &snapshot, snapshot.history(stage), message)
    }

    /// Whether `stage` keeps a conversation.
    pub fn is_chat_stage(stage: StageIdentifier) -> bool {
        stage.is_chat() || stage == StageIdentifier::CharacterGenerator
    }

    /// One conversational turn with a chat-capable stage.
    ///
    /// The exchange is appended to the stage's history once the reply is in.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` if `stage` has no conversational mode.
    #[instrument(skip(self, message), fields(project = self.store.project()))]
    pub async fn chat(&self, stage: StageIdentifier, message: &str) -> OpentaleResult<String> {
        let snapshot = self.snapshot().await;
        let request = self.chat_request(stage, &snapshot, message)?;
        let reply = self.orchestrator.run_verbatim(&*self.service, &request).await?;
        self.store.append_chat_turn(stage, message, &reply).await?;
        Ok(reply)
    }

    /// Streaming form of [`Studio::chat`]; a cancelled turn is not recorded.
    pub async fn chat_stream(
        &self,
        stage: StageIdentifier,
        message: &str,
        sink: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> OpentaleResult<StreamOutcome> {
        let snapshot = self.snapshot().await;
        let request = self.chat_request(stage, &snapshot, message)?;
        let target = SlotTarget::ChatTurn {
            stage,
            user_turn: message.to_string(),
        };
        self.streamed(request, target, sink, cancel).await
    }

    // Characters

    fn characters_request(
        &self,
        snapshot: &ContextSnapshot,
        count: Option<u32>,
    ) -> OpentaleResult<GenerationRequest> {
        let count = count.unwrap_or(self.settings.character_count);
        let prompt = prompts::character_creation_prompt(snapshot.world_theme(), count);
        self.orchestrator
            .build(StageIdentifier::CharacterGenerator, snapshot, &[], &prompt)
    }

    fn finalize_characters_request(
        &self,
        snapshot: &ContextSnapshot,
        count: Option<u32>,
    ) -> OpentaleResult<GenerationRequest> {
        let count = count.unwrap_or(self.settings.character_count);
        self.orchestrator.build(
            StageIdentifier::CharacterGenerator,
            snapshot,
            snapshot.history(StageIdentifier::CharacterGenerator),
            &prompts::finalize_characters_prompt(count),
        )
    }

    /// Generate character profiles for the stored world.
    #[instrument(skip(self), fields(project = self.store.project()))]
    pub async fn generate_characters(&self, count: Option<u32>) -> OpentaleResult<StageOutput> {
        let snapshot = self.snapshot().await;
        let request = self.characters_request(&snapshot, count)?;
        self.direct(&request, SlotTarget::Characters).await
    }

    /// Streaming form of [`Studio::generate_characters`].
    pub async fn generate_characters_stream(
        &self,
        count: Option<u32>,
        sink: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> OpentaleResult<StreamOutcome> {
        let snapshot = self.snapshot().await;
        let request = self.characters_request(&snapshot, count)?;
        self.streamed(request, SlotTarget::Characters, sink, cancel).await
    }

    /// Turn the character conversation into the final profiles.
    #[instrument(skip(self), fields(project = self.store.project()))]
    pub async fn finalize_characters(&self, count: Option<u32>) -> OpentaleResult<StageOutput> {
        let snapshot = self.snapshot().await;
        let request = self.finalize_characters_request(&snapshot, count)?;
        self.direct(&request, SlotTarget::Characters).await
    }

    /// Streaming form of [`Studio::finalize_characters`].
    pub async fn finalize_characters_stream(
        &self,
        count: Option<u32>,
        sink: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> OpentaleResult<StreamOutcome> {
        let snapshot = self.snapshot().await;
        let request = self.finalize_characters_request(&snapshot, count)?;
        self.streamed(request, SlotTarget::Characters, sink, cancel)
            .await
    }

    // Outline

    fn outline_request(
        &self,
        snapshot: &ContextSnapshot,
        declared: u32,
    ) -> OpentaleResult<GenerationRequest> {
        let snapshot = self.with_declared_chapters(snapshot, declared);
        let prompt = prompts::outline_generation_prompt(
            snapshot.world_theme(),
            snapshot.characters(),
            declared,
        );
        self.orchestrator
            .build(StageIdentifier::OutlineCreator, &snapshot, &[], &prompt)
    }

    fn finalize_outline_request(
        &self,
        snapshot: &ContextSnapshot,
        declared: u32,
    ) -> OpentaleResult<GenerationRequest> {
        let snapshot = self.with_declared_chapters(snapshot, declared);
        let request = self.orchestrator.build(
            StageIdentifier::OutlineCreator,
            &snapshot,
            snapshot.history(StageIdentifier::OutlineCreatorChat),
            &prompts::finalize_outline_prompt(declared),
        )?;
        let params = request
            .params()
            .with_temperature(self.settings.outline_temperature);
        Ok(request.with_params(params))
    }

    /// Generate the outline and parse it into chapter records.
    #[instrument(skip(self), fields(project = self.store.project()))]
    pub async fn generate_outline(&self) -> OpentaleResult<StageOutput> {
        let snapshot = self.snapshot().await;
        let declared = self.declared_chapters(&snapshot);
        let request = self.outline_request(&snapshot, declared)?;
        self.direct(
            &request,
            SlotTarget::Outline {
                declared_chapter_count: declared,
            },
        )
        .await
    }

    /// Streaming form of [`Studio::generate_outline`].
    pub async fn generate_outline_stream(
        &self,
        sink: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> OpentaleResult<StreamOutcome> {
        let snapshot = self.snapshot().await;
        let declared = self.declared_chapters(&snapshot);
        let request = self.outline_request(&snapshot, declared)?;
        let target = SlotTarget::Outline {
            declared_chapter_count: declared,
        };
        self.streamed(request, target, sink, cancel).await
    }

    /// Turn the outline conversation into the final outline.
    #[instrument(skip(self), fields(project = self.store.project()))]
    pub async fn finalize_outline(&self) -> OpentaleResult<StageOutput> {
        let snapshot = self.snapshot().await;
        let declared = self.declared_chapters(&snapshot);
        let request = self.finalize_outline_request(&snapshot, declared)?;
        self.direct(
            &request,
            SlotTarget::Outline {
                declared_chapter_count: declared,
            },
        )
        .await
    }

    /// Streaming form of [`Studio::finalize_outline`].
    pub async fn finalize_outline_stream(
        &self,
        sink: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> OpentaleResult<StreamOutcome> {
        let snapshot = self.snapshot().await;
        let declared = self.declared_chapters(&snapshot);
        let request = self.finalize_outline_request(&snapshot, declared)?;
        let target = SlotTarget::Outline {
            declared_chapter_count: declared,
        };
        self.streamed(request, target, sink, cancel).await
    }

    // Chapters

    /// Re-parse the stored outline into chapter records.
    ///
    /// # Errors
    ///
    /// `NotFoundError` if no outline has been stored.
    pub async fn regenerate_chapters(&self, declared: Option<u32>) -> OpentaleResult<StageOutput> {
        let snapshot = self.snapshot().await;
        let declared = declared.unwrap_or_else(|| self.declared_chapters(&snapshot));
        let warning = self.store.reparse_outline(declared).await?;
        Ok(StageOutput::with_warning(
            snapshot.outline().raw_text().clone(),
            warning,
        ))
    }

    /// Draft chapter `number`.
    pub async fn generate_chapter(
        &self,
        number: u32,
        additional: Option<&str>,
    ) -> OpentaleResult<StageOutput> {
        let snapshot = self.snapshot().await;
        self.chapters.generate(number, &snapshot, additional).await
    }

    /// Streaming form of [`Studio::generate_chapter`].
    pub async fn generate_chapter_stream(
        &self,
        number: u32,
        additional: Option<&str>,
        sink: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> OpentaleResult<StreamOutcome> {
        let snapshot = self.snapshot().await;
        self.chapters
            .generate_stream(number, &snapshot, additional, sink, cancel)
            .await
    }

    /// Revise chapter `number` with the editor stage.
    pub async fn edit_chapter(&self, number: u32) -> OpentaleResult<StageOutput> {
        let snapshot = self.snapshot().await;
        self.chapters.edit(number, &snapshot).await
    }

    // Consultation

    /// Run a stage against the current state without storing anything.
    ///
    /// Meant for the story planner and the memory keeper, whose output is
    /// advice for the author rather than a project artifact.
    #[instrument(skip(self, message), fields(project = self.store.project()))]
    pub async fn consult(&self, stage: StageIdentifier, message: &str) -> OpentaleResult<String> {
        let snapshot = self.snapshot().await;
        let request = self.orchestrator.build(stage, &snapshot, &[], message)?;
        self.orchestrator.run(&*self.service, &request).await
    }

    // Manual edits

    /// Replace the world setting with author-edited text.
    pub async fn save_world(&self, text: &str) -> OpentaleResult<StageOutput> {
        let text = normalize_manual_edit(text);
        self.store.write_world(&text).await?;
        Ok(StageOutput::new(text))
    }

    /// Replace the character profiles with author-edited text.
    pub async fn save_characters(&self, text: &str) -> OpentaleResult<StageOutput> {
        let text = normalize_manual_edit(text);
        self.store.write_characters(&text).await?;
        Ok(StageOutput::new(text))
    }

    /// Replace the outline with author-edited text and re-parse it.
    pub async fn save_outline(
        &self,
        text: &str,
        declared: Option<u32>,
    ) -> OpentaleResult<StageOutput> {
        let snapshot = self.snapshot().await;
        let declared = declared.unwrap_or_else(|| self.declared_chapters(&snapshot));
        let text = normalize_manual_edit(text);
        let warning = self.store.write_outline(&text, declared).await?;
        Ok(StageOutput::with_warning(text, warning))
    }

    /// Drop every artifact of the project.
    pub async fn reset(&self) -> OpentaleResult<()> {
        self.store.reset().await
    }
}
