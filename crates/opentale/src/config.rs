//! Configuration loading for OpenTale.
//!
//! Sources are merged with later ones taking precedence:
//! 1. Bundled defaults (include_str! from opentale.toml)
//! 2. `~/.config/opentale/opentale.toml`
//! 3. `./opentale.toml`
//! 4. `OPENTALE_<SECTION>__<KEY>` environment variables
//!
//! API keys never live in configuration; `[provider] api_key_env` names the
//! environment variable that holds the key.

use config::{Config, Environment, File, FileFormat};
use opentale_core::GenerationParams;
use opentale_error::{OpentaleError, OpentaleResult, SettingsError};
use opentale_pipeline::{PromptCatalog, StageOrchestrator, StudioSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
pub const DEFAULT_CONFIG: &str = include_str!("../../../opentale.toml");

/// Chat-completions endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Default sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum output tokens
    pub max_tokens: u32,
    /// Temperature used when finalizing an outline
    pub outline_temperature: f32,
    /// Optional sampling seed
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Project defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Directory holding every project
    pub output_dir: PathBuf,
    /// Project used when none is given on the command line
    pub name: String,
    /// Chapters declared for a new project
    pub chapter_count: u32,
    /// Characters requested when none is given
    pub character_count: u32,
}

/// Complete OpenTale configuration.
///
/// # Examples
///
/// ```
/// use opentale::OpentaleConfig;
///
/// let config = OpentaleConfig::from_toml("[provider]\nmodel = \"openai/gpt-4o\"").unwrap();
/// assert_eq!(config.provider.model, "openai/gpt-4o");
/// assert_eq!(config.generation.max_tokens, 8000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpentaleConfig {
    /// Endpoint settings
    pub provider: ProviderConfig,
    /// Sampling defaults
    pub generation: GenerationConfig,
    /// Project defaults
    pub project: ProjectConfig,
    /// System prompt overrides keyed by stage identifier
    #[serde(default)]
    pub prompts: HashMap<String, String>,
}

impl OpentaleConfig {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a present file is malformed or a value has
    /// the wrong type.
    #[instrument]
    pub fn load() -> OpentaleResult<Self> {
        debug!("Loading configuration: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("opentale").join("opentale.toml");
            builder = builder.add_source(File::from(user_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("opentale").required(false))
            .add_source(
                Environment::with_prefix("OPENTALE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::finish(builder.build())
    }

    /// Load the bundled defaults overlaid with one file.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the file is missing or malformed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> OpentaleResult<Self> {
        debug!("Loading configuration from file");

        Self::finish(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from(path.as_ref()))
                .build(),
        )
    }

    /// Parse TOML text overlaid on the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the text is malformed.
    pub fn from_toml(text: &str) -> OpentaleResult<Self> {
        Self::finish(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from_str(text, FileFormat::Toml))
                .build(),
        )
    }

    fn finish(built: Result<Config, config::ConfigError>) -> OpentaleResult<Self> {
        built
            .map_err(|e| {
                OpentaleError::from(SettingsError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                OpentaleError::from(SettingsError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }

    /// Default sampling parameters.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError` for a negative temperature or zero `max_tokens`.
    pub fn generation_params(&self) -> OpentaleResult<GenerationParams> {
        let mut builder = GenerationParams::builder();
        builder
            .temperature(self.generation.temperature)
            .max_tokens(self.generation.max_tokens);
        if let Some(seed) = self.generation.seed {
            builder.seed(seed);
        }
        Ok(builder.build()?)
    }

    /// Prompt catalog with the configured overrides applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` for an unknown stage or template slot.
    pub fn prompt_catalog(&self) -> OpentaleResult<PromptCatalog> {
        Ok(PromptCatalog::with_overrides(&self.prompts)?)
    }

    /// Orchestrator built from the catalog and sampling defaults.
    pub fn orchestrator(&self) -> OpentaleResult<StageOrchestrator> {
        Ok(StageOrchestrator::new(
            self.prompt_catalog()?,
            self.generation_params()?,
        ))
    }

    /// Workflow settings.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError` if a count is zero.
    pub fn studio_settings(&self) -> OpentaleResult<StudioSettings> {
        Ok(StudioSettings::builder()
            .outline_temperature(self.generation.outline_temperature)
            .character_count(self.project.character_count)
            .chapter_count(self.project.chapter_count)
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentale_error::OpentaleErrorKind;

    #[test]
    fn bundled_defaults() {
        let config = OpentaleConfig::from_toml("").unwrap();
        assert_eq!(config.provider.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.provider.model, "google/gemma-3-27b-it");
        assert_eq!(config.provider.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(config.timeout(), Duration::from_secs(600));
        assert_eq!(config.generation.temperature, 0.7);
        assert_eq!(config.generation.outline_temperature, 0.6);
        assert_eq!(config.generation.seed, Some(42));
        assert_eq!(config.project.output_dir, PathBuf::from("book_output"));
        assert_eq!(config.project.chapter_count, 10);
        assert!(config.prompts.is_empty());
    }

    #[test]
    fn overlay_replaces_only_given_keys() {
        let config = OpentaleConfig::from_toml(
            "[generation]\ntemperature = 0.9\n\n[project]\nname = \"harbor\"",
        )
        .unwrap();
        assert_eq!(config.generation.temperature, 0.9);
        assert_eq!(config.generation.max_tokens, 8000);
        assert_eq!(config.project.name, "harbor");
        assert_eq!(config.project.character_count, 3);
    }

    #[test]
    fn malformed_value_is_a_settings_error() {
        let err = OpentaleConfig::from_toml("[generation]\nmax_tokens = \"many\"").unwrap_err();
        assert!(matches!(err.kind(), OpentaleErrorKind::Settings(_)));
    }

    #[test]
    fn generation_params_carry_seed() {
        let params = OpentaleConfig::from_toml("")
            .unwrap()
            .generation_params()
            .unwrap();
        assert_eq!(*params.seed(), Some(42));
        assert_eq!(*params.max_tokens(), 8000);
    }

    #[test]
    fn unknown_prompt_override_is_rejected() {
        let config =
            OpentaleConfig::from_toml("[prompts]\nnarrator = \"Narrate {{topic}}.\"").unwrap();
        let err = config.prompt_catalog().unwrap_err();
        assert!(matches!(err.kind(), OpentaleErrorKind::Configuration(_)));
    }

    #[test]
    fn zero_chapter_count_is_rejected() {
        let config = OpentaleConfig::from_toml("[project]\nchapter_count = 0").unwrap();
        assert!(config.studio_settings().is_err());
    }

    #[test]
    fn file_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[provider]\nmodel = \"meta/llama\"\ntimeout_secs = 30\n").unwrap();

        let config = OpentaleConfig::from_file(&path).unwrap();
        assert_eq!(config.provider.model, "meta/llama");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.project.output_dir, PathBuf::from("book_output"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(OpentaleConfig::from_file(dir.path().join("absent.toml")).is_err());
    }
}
