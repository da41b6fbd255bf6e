//! Error types for OpenTale.
//!
//! This crate provides the error taxonomy shared by every stage of the
//! writing pipeline.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! `ParseFallbackWarning` is deliberately not an error: the outline parser
//! returns it next to its stub records so callers can report that the
//! outline text was not honored.
//!
//! # Examples
//!
//! ```
//! use opentale_error::{NotFoundError, NotFoundKind, OpentaleResult};
//!
//! fn lookup(number: u32) -> OpentaleResult<String> {
//!     Err(NotFoundError::new(NotFoundKind::Chapter(number)))?
//! }
//!
//! match lookup(4) {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod configuration;
mod error;
mod json;
mod not_found;
mod prerequisite;
mod settings;
mod storage;
mod upstream;
mod warning;

pub use builder::{BuilderError, BuilderErrorKind};
pub use configuration::{ConfigurationError, ConfigurationErrorKind};
pub use error::{OpentaleError, OpentaleErrorKind, OpentaleResult};
pub use json::JsonError;
pub use not_found::{NotFoundError, NotFoundKind};
pub use prerequisite::{MissingPrerequisiteError, Prerequisite};
pub use settings::SettingsError;
pub use storage::{StorageError, StorageErrorKind};
pub use upstream::{UpstreamGenerationError, UpstreamGenerationErrorKind};
pub use warning::ParseFallbackWarning;
