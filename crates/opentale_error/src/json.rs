//! Failures encoding or decoding persisted JSON artifacts.

/// A JSON artifact that could not be (de)serialized.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error in {}: {} at line {} in {}", artifact, message, line, file)]
pub struct JsonError {
    /// Artifact being read or written, e.g. "chapters"
    pub artifact: String,
    /// Message from serde_json
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Create a JsonError for `artifact` at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use opentale_error::JsonError;
    ///
    /// let err = JsonError::new("chapters", "expected value at line 1 column 1");
    /// assert!(format!("{}", err).starts_with("JSON Error in chapters"));
    /// ```
    #[track_caller]
    pub fn new(artifact: impl std::fmt::Display, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            artifact: artifact.to_string(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
