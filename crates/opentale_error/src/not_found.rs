//! Lookup errors.

/// What was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum NotFoundKind {
    /// No chapter record with this number
    #[display("Chapter {} not found", _0)]
    Chapter(u32),
    /// No outline stored for the project
    #[display("Outline not found")]
    Outline,
}

/// Lookup error with location tracking.
///
/// # Examples
///
/// ```
/// use opentale_error::{NotFoundError, NotFoundKind};
///
/// let err = NotFoundError::new(NotFoundKind::Chapter(7));
/// assert!(format!("{}", err).contains("Chapter 7"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Not Found: {} at line {} in {}", kind, line, file)]
pub struct NotFoundError {
    /// The missing record
    pub kind: NotFoundKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl NotFoundError {
    /// Create a new NotFoundError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: NotFoundKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
