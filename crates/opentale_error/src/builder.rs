//! Failures assembling requests and settings.

/// What could not be assembled, and why.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BuilderErrorKind {
    /// A builder was finished with a required field unset
    #[display("Incomplete {}: {}", target, reason)]
    Incomplete {
        /// What was being built, e.g. "generation request"
        target: &'static str,
        /// Message from the builder
        reason: String,
    },

    /// Temperature or token budget out of range
    #[display("Invalid sampling parameters: {}", _0)]
    InvalidParams(String),

    /// Zero character or chapter count
    #[display("Invalid studio settings: {}", _0)]
    InvalidSettings(String),
}

/// Builder error with location tracking.
///
/// # Examples
///
/// ```
/// use opentale_error::{BuilderError, BuilderErrorKind};
///
/// let err = BuilderError::new(BuilderErrorKind::InvalidParams(
///     "max_tokens must be positive".to_string(),
/// ));
/// assert!(format!("{}", err).contains("Invalid sampling parameters"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Builder Error: {} at line {} in {}", kind, line, file)]
pub struct BuilderError {
    /// What went wrong
    pub kind: BuilderErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl BuilderError {
    /// Create a new builder error with caller location tracking.
    #[track_caller]
    pub fn new(kind: BuilderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// A builder finished with `target` missing a field.
    #[track_caller]
    pub fn incomplete(target: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::new(BuilderErrorKind::Incomplete {
            target,
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_names_target() {
        let err = BuilderError::incomplete("generation request", "`user_turn` must be initialized");
        assert_eq!(
            err.kind,
            BuilderErrorKind::Incomplete {
                target: "generation request",
                reason: "`user_turn` must be initialized".to_string(),
            }
        );
        assert!(err.to_string().contains("Incomplete generation request"));
        assert!(err.file.ends_with("builder.rs"));
    }
}
