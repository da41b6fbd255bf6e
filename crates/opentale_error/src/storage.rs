//! Artifact storage failures.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StorageErrorKind {
    /// The output or project directory could not be created
    #[display("Cannot create directory {}: {}", path, reason)]
    DirectoryCreation {
        /// Directory path
        path: String,
        /// I/O error message
        reason: String,
    },
    /// An artifact could not be written or moved into place
    #[display("Cannot write {}: {}", path, reason)]
    FileWrite {
        /// Artifact path
        path: String,
        /// I/O error message
        reason: String,
    },
    /// An existing artifact could not be read
    #[display("Cannot read {}: {}", path, reason)]
    FileRead {
        /// Artifact path
        path: String,
        /// I/O error message
        reason: String,
    },
    /// An artifact or project could not be removed
    #[display("Cannot delete {}: {}", path, reason)]
    Delete {
        /// Artifact or project path
        path: String,
        /// I/O error message
        reason: String,
    },
    /// Project name is empty or would leave the output directory
    #[display("Invalid project name: {:?}", _0)]
    InvalidProject(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use opentale_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::InvalidProject("../escape".to_string()));
/// assert!(format!("{}", err).contains("Invalid project name"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
