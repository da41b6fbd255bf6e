//! Core data types for OpenTale.
//!
//! This crate provides the data model shared by every pipeline stage:
//! stage identifiers, chat messages, chapter records, outline documents,
//! context snapshots and generation requests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chapter;
mod event;
mod message;
mod outline;
mod request;
mod role;
mod slot;
mod snapshot;
mod stage;

pub use chapter::ChapterRecord;
pub use event::{DONE_SENTINEL, StreamEvent};
pub use message::ChatMessage;
pub use outline::OutlineDocument;
pub use request::{GenerationParams, GenerationParamsBuilder, GenerationRequest};
pub use role::Role;
pub use slot::ArtifactSlot;
pub use snapshot::ContextSnapshot;
pub use stage::StageIdentifier;
