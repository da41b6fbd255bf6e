//! Settings-file loading errors.

/// Failure to load or deserialize `opentale.toml`.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Settings Error: {} at line {} in {}", message, line, file)]
pub struct SettingsError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl SettingsError {
    /// Create a new SettingsError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use opentale_error::SettingsError;
    ///
    /// let err = SettingsError::new("missing field `provider`");
    /// assert!(err.message.contains("provider"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
