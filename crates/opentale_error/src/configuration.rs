//! Configuration errors: programmer mistakes that are fatal to a request.

/// Specific configuration error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ConfigurationErrorKind {
    /// Stage identifier is not part of the prompt catalog
    #[display("Unknown stage identifier: {}", _0)]
    UnknownStage(String),
    /// Stage has no conversational mode
    #[display("Stage '{}' does not support chat", _0)]
    NotChatStage(String),
    /// Template references a slot the renderer does not know
    #[display("Template for stage '{}' references unknown slot '{}'", stage, slot)]
    UnknownSlot {
        /// Stage whose template is malformed
        stage: String,
        /// The unresolved slot name
        slot: String,
    },
}

/// Configuration error with location tracking.
///
/// # Examples
///
/// ```
/// use opentale_error::{ConfigurationError, ConfigurationErrorKind};
///
/// let err = ConfigurationError::new(ConfigurationErrorKind::UnknownStage("poet".into()));
/// assert!(format!("{}", err).contains("poet"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigurationError {
    /// The specific error condition
    pub kind: ConfigurationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ConfigurationError {
    /// Create a new ConfigurationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ConfigurationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
