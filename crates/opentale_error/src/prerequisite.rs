//! Stage ordering errors.

/// A slot of project state that some stage depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum Prerequisite {
    /// The world setting document
    #[display("world theme")]
    WorldTheme,
    /// The character profiles
    #[display("characters")]
    Characters,
    /// A parsed outline with at least one chapter record
    #[display("outline")]
    Outline,
    /// Generated content for a chapter
    #[display("content of chapter {}", _0)]
    ChapterContent(u32),
}

/// A stage was invoked before its dependency stage populated its slot.
///
/// Hosts surface this as navigation guidance (e.g. "create a world first").
///
/// # Examples
///
/// ```
/// use opentale_error::{MissingPrerequisiteError, Prerequisite};
///
/// let err = MissingPrerequisiteError::new("outline_creator", Prerequisite::WorldTheme);
/// assert_eq!(err.prerequisite, Prerequisite::WorldTheme);
/// assert!(format!("{}", err).contains("world theme"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "Missing Prerequisite: stage '{}' requires {} at line {} in {}",
    stage,
    prerequisite,
    line,
    file
)]
pub struct MissingPrerequisiteError {
    /// Stage that was invoked
    pub stage: String,
    /// The slot that was empty
    pub prerequisite: Prerequisite,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl MissingPrerequisiteError {
    /// Create a new MissingPrerequisiteError with automatic location tracking.
    #[track_caller]
    pub fn new(stage: impl Into<String>, prerequisite: Prerequisite) -> Self {
        let location = std::panic::Location::caller();
        Self {
            stage: stage.into(),
            prerequisite,
            line: location.line(),
            file: location.file(),
        }
    }
}
