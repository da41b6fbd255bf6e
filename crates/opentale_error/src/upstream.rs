//! Generation service errors.

/// Ways a call to the generation service can fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum UpstreamGenerationErrorKind {
    /// Transport-level failure (connection refused, timeout, ...)
    #[display("Request failed: {}", _0)]
    Request(String),
    /// Service answered with a non-success status
    #[display("API error (status {}): {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Body returned by the service
        message: String,
    },
    /// Service answered but the reply carried no text
    #[display("Empty response from generation service")]
    EmptyResponse,
    /// Stream broke off before its end-of-stream signal
    #[display("Stream interrupted: {}", _0)]
    StreamInterrupted(String),
    /// Reply could not be decoded
    #[display("Failed to parse response: {}", _0)]
    ResponseParsing(String),
    /// No API key available for the provider
    #[display("Missing credentials: {}", _0)]
    MissingCredentials(String),
}

/// Generation service error with location tracking.
///
/// # Examples
///
/// ```
/// use opentale_error::{UpstreamGenerationError, UpstreamGenerationErrorKind};
///
/// let err = UpstreamGenerationError::new(UpstreamGenerationErrorKind::EmptyResponse);
/// assert!(format!("{}", err).contains("Empty response"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Upstream Generation Error: {} at line {} in {}", kind, line, file)]
pub struct UpstreamGenerationError {
    /// The specific error condition
    pub kind: UpstreamGenerationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl UpstreamGenerationError {
    /// Create a new UpstreamGenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: UpstreamGenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
