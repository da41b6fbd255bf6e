//! Staged generation pipeline for OpenTale.
//!
//! This crate turns a topic into a book one stage at a time. Each stage
//! renders its system prompt from the project snapshot, calls a
//! [`GenerationService`](opentale_interface::GenerationService), extracts the
//! usable part of the reply and writes exactly one slot of the
//! [`ContextStore`].
//!
//! # Components
//!
//! - [`PromptCatalog`]: one system prompt template per stage
//! - [`StageOrchestrator`]: request assembly, dispatch and extraction
//! - [`StreamAggregator`]: forwards deltas, persists only completed streams
//! - [`parse_outline`]: raw outline text to ordered chapter records
//! - [`ChapterPipeline`]: writer and editor stages for one chapter
//! - [`Studio`]: the workflows that sequence all of the above
//!
//! # Example
//!
//! ```rust,ignore
//! use opentale_pipeline::{ContextStore, StageOrchestrator, Studio, StudioSettings};
//! use opentale_storage::FileSystemArtifactStore;
//! use std::sync::Arc;
//!
//! # async fn example(service: Arc<dyn opentale_interface::Streaming>) -> opentale_error::OpentaleResult<()> {
//! let backend = Arc::new(FileSystemArtifactStore::new("book_output")?);
//! let store = Arc::new(ContextStore::open("harbor", backend).await?);
//! let studio = Studio::new(StageOrchestrator::default(), service, store, StudioSettings::default());
//!
//! studio.begin("lighthouse keepers on a dying coast", 10).await?;
//! studio.generate_world().await?;
//! studio.generate_characters(None).await?;
//! let outline = studio.generate_outline().await?;
//! if let Some(warning) = outline.warning() {
//!     eprintln!("{}", warning);
//! }
//! studio.generate_chapter(1, None).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod aggregator;
mod catalog;
mod chapter;
mod context;
mod extraction;
mod normalize;
mod orchestrator;
mod outline;
mod prompts;
mod studio;

pub use aggregator::{StageOutput, StreamAggregator, StreamOutcome};
pub use catalog::{PromptCatalog, TemplateSlot, outline_overview};
pub use chapter::{ChapterPipeline, PREVIOUS_CONTEXT_CHARS, previous_context};
pub use context::{ContextStore, SlotTarget};
pub use extraction::{ExtractionRule, extract, rule_for};
pub use normalize::{NewlinePolicy, normalize_manual_edit};
pub use orchestrator::StageOrchestrator;
pub use outline::{OUTLINE_END, OUTLINE_START, ParsedOutline, parse_outline, parse_with_report};
pub use prompts::{
    ChapterBrief, ChapterBriefBuilder, chapter_editing_prompt, chapter_generation_prompt,
    character_creation_prompt, finalize_characters_prompt, finalize_outline_prompt,
    finalize_world_prompt, outline_generation_prompt, world_suggestions_prompt, world_theme_prompt,
};
pub use studio::{Studio, StudioSettings, StudioSettingsBuilder};
