//! Trait definitions for OpenTale.
//!
//! This crate defines the boundaries of the pipeline: the generation
//! service it consumes and the artifact store that backs project state.

mod store;
mod traits;
mod types;

pub use store::{ArtifactKey, ArtifactStore};
pub use traits::{ChunkStream, GenerationService, Streaming};
pub use types::{FinishReason, StreamChunk};
