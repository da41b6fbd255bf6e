//! OpenTale - staged LLM writing pipeline
//!
//! OpenTale drives a long-form writing workflow through an LLM: world
//! building, character creation, outline generation, then per-chapter
//! drafting and editing. Each stage consumes the artifacts of the stages
//! before it.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use opentale::{
//!     ChatCompletionsDriver, ContextStore, FileSystemArtifactStore, OpentaleConfig, Studio,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OpentaleConfig::load()?;
//!     let driver = ChatCompletionsDriver::from_env(
//!         &config.provider.api_key_env,
//!         &config.provider.model,
//!         &config.provider.base_url,
//!         config.timeout(),
//!     )?;
//!     let backend = Arc::new(FileSystemArtifactStore::new(&config.project.output_dir)?);
//!     let store = Arc::new(ContextStore::open("harbor", backend).await?);
//!     let studio = Studio::new(
//!         config.orchestrator()?,
//!         Arc::new(driver),
//!         store,
//!         config.studio_settings()?,
//!     );
//!
//!     studio.begin("lighthouse keepers", 10).await?;
//!     let world = studio.generate_world().await?;
//!     println!("{}", world.text());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `opentale_error` - Error types
//! - `opentale_core` - Data model (stages, chapters, snapshots, stream events)
//! - `opentale_interface` - Generation and storage traits
//! - `opentale_models` - OpenAI-compatible chat-completions client
//! - `opentale_storage` - Filesystem and in-memory artifact stores
//! - `opentale_pipeline` - Orchestrator, outline parser, stream aggregator, workflows
//!
//! This crate re-exports everything and adds configuration loading.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;

pub use config::{
    DEFAULT_CONFIG, GenerationConfig, OpentaleConfig, ProjectConfig, ProviderConfig,
};

pub use opentale_error::*;

pub use opentale_core::{
    ArtifactSlot, ChapterRecord, ChatMessage, ContextSnapshot, DONE_SENTINEL, GenerationParams,
    GenerationRequest, OutlineDocument, Role, StageIdentifier, StreamEvent,
};

pub use opentale_interface::{
    ArtifactKey, ArtifactStore, ChunkStream, FinishReason, GenerationService, StreamChunk,
    Streaming,
};

pub use opentale_models::ChatCompletionsDriver;

pub use opentale_storage::{FileSystemArtifactStore, InMemoryArtifactStore};

pub use opentale_pipeline::{
    ChapterPipeline, ContextStore, ParsedOutline, PromptCatalog, SlotTarget, StageOrchestrator,
    StageOutput, StreamAggregator, StreamOutcome, Studio, StudioSettings, normalize_manual_edit,
    parse_outline, parse_with_report,
};
