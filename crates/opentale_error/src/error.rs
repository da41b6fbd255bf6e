//! Top-level error wrapper types.

use crate::{
    BuilderError, ConfigurationError, JsonError, MissingPrerequisiteError, NotFoundError,
    SettingsError, StorageError, UpstreamGenerationError,
};

/// Every error condition the pipeline can surface to its caller.
///
/// # Examples
///
/// ```
/// use opentale_error::{OpentaleError, ConfigurationError, ConfigurationErrorKind};
///
/// let err: OpentaleError =
///     ConfigurationError::new(ConfigurationErrorKind::UnknownStage("narrator".into())).into();
/// assert!(format!("{}", err).contains("narrator"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum OpentaleErrorKind {
    /// Unknown stage identifier or malformed prompt template
    #[from(ConfigurationError)]
    Configuration(ConfigurationError),
    /// The generation service failed or returned nothing usable
    #[from(UpstreamGenerationError)]
    Upstream(UpstreamGenerationError),
    /// A stage ran before the stage it depends on
    #[from(MissingPrerequisiteError)]
    MissingPrerequisite(MissingPrerequisiteError),
    /// Chapter or outline lookup with no record
    #[from(NotFoundError)]
    NotFound(NotFoundError),
    /// Durable artifact storage failure
    #[from(StorageError)]
    Storage(StorageError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration file loading error
    #[from(SettingsError)]
    Settings(SettingsError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
}

/// OpenTale error with kind discrimination.
///
/// # Examples
///
/// ```
/// use opentale_error::{OpentaleResult, SettingsError};
///
/// fn might_fail() -> OpentaleResult<()> {
///     Err(SettingsError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("OpenTale Error: {}", _0)]
pub struct OpentaleError(Box<OpentaleErrorKind>);

impl OpentaleError {
    /// Create a new error from a kind.
    pub fn new(kind: OpentaleErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &OpentaleErrorKind {
        &self.0
    }

    /// Whether this error reports a failed generation call.
    pub fn is_upstream(&self) -> bool {
        matches!(self.kind(), OpentaleErrorKind::Upstream(_))
    }
}

// Generic From implementation for any type that converts to OpentaleErrorKind
impl<T> From<T> for OpentaleError
where
    T: Into<OpentaleErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for OpenTale operations.
pub type OpentaleResult<T> = std::result::Result<T, OpentaleError>;
