//! Generation requests and sampling parameters.

use crate::{ChatMessage, ContextSnapshot, StageIdentifier};
use opentale_error::{BuilderError, BuilderErrorKind};
use serde::{Deserialize, Serialize};

/// Sampling parameters sent with every generation call.
///
/// # Examples
///
/// ```
/// use opentale_core::GenerationParams;
///
/// let params = GenerationParams::builder()
///     .temperature(0.6)
///     .max_tokens(4000u32)
///     .build()
///     .unwrap();
/// assert_eq!(*params.max_tokens(), 4000);
///
/// let defaults = GenerationParams::default();
/// assert_eq!(*defaults.temperature(), 0.7);
/// ```
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters, derive_builder::Builder,
)]
#[builder(build_fn(private, name = "build_internal"))]
pub struct GenerationParams {
    /// Sampling temperature
    #[builder(default = "0.7")]
    temperature: f32,
    /// Maximum number of tokens to generate
    #[builder(default = "8000")]
    max_tokens: u32,
    /// Optional sampling seed
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 8000,
            seed: None,
        }
    }
}

impl GenerationParams {
    /// Creates a new params builder.
    pub fn builder() -> GenerationParamsBuilder {
        GenerationParamsBuilder::default()
    }

    /// Copy with a different temperature.
    pub fn with_temperature(&self, temperature: f32) -> Self {
        Self {
            temperature,
            ..self.clone()
        }
    }
}

impl GenerationParamsBuilder {
    /// Build the GenerationParams.
    ///
    /// # Errors
    ///
    /// Returns error if the temperature is negative or `max_tokens` is zero.
    pub fn build(&self) -> Result<GenerationParams, BuilderError> {
        let params = self
            .build_internal()
            .map_err(|e| BuilderError::incomplete("generation params", e))?;
        if params.temperature < 0.0 {
            return Err(BuilderError::new(BuilderErrorKind::InvalidParams(
                format!("temperature must be non-negative, got {}", params.temperature),
            )));
        }
        if params.max_tokens == 0 {
            return Err(BuilderError::new(BuilderErrorKind::InvalidParams(
                "max_tokens must be positive".to_string(),
            )));
        }
        Ok(params)
    }
}

/// One call to the generation service, assembled for a stage.
///
/// Built fresh per call and never mutated after dispatch.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct GenerationRequest {
    /// Originating stage
    stage: StageIdentifier,
    /// Project state the prompt was rendered from
    context: ContextSnapshot,
    /// Rendered stage template
    system_prompt: String,
    /// Prior turns, replayed in order
    #[builder(default)]
    history: Vec<ChatMessage>,
    /// Final user message
    user_turn: String,
    /// Whether the caller consumes deltas
    #[builder(default)]
    streaming: bool,
    /// Sampling parameters
    #[builder(default)]
    params: GenerationParams,
}

impl GenerationRequest {
    /// Creates a new request builder.
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }

    /// The same request marked for streaming dispatch.
    pub fn into_streaming(self) -> Self {
        Self {
            streaming: true,
            ..self
        }
    }

    /// The same request with different sampling parameters.
    pub fn with_params(self, params: GenerationParams) -> Self {
        Self { params, ..self }
    }

    /// Messages after the system prompt: history then the user turn.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(self.user_turn.clone()));
        messages
    }

    /// Full conversation as sent: system prompt, history, user turn.
    pub fn conversation(&self) -> Vec<ChatMessage> {
        let mut conversation = vec![ChatMessage::system(self.system_prompt.clone())];
        conversation.extend(self.messages());
        conversation
    }
}
