//! Chat-completions driver implementing the OpenTale generation traits.

use crate::openai_compat::{OpenAICompatError, OpenAICompatibleClient};
use async_trait::async_trait;
use futures_util::StreamExt;
use opentale_core::{ChatMessage, GenerationParams};
use opentale_error::{
    OpentaleError, OpentaleResult, UpstreamGenerationError, UpstreamGenerationErrorKind,
};
use opentale_interface::{ChunkStream, GenerationService, Streaming};
use std::time::Duration;
use tracing::{debug, instrument};

/// Generation service backed by an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsDriver {
    inner: OpenAICompatibleClient,
}

impl ChatCompletionsDriver {
    /// Creates a driver reading the API key from `api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if the variable is unset or empty.
    #[instrument(skip_all, fields(model = %model.as_ref(), env = api_key_env))]
    pub fn from_env(
        api_key_env: &str,
        model: impl AsRef<str>,
        base_url: &str,
        timeout: Duration,
    ) -> OpentaleResult<Self> {
        let api_key = std::env::var(api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                UpstreamGenerationError::new(UpstreamGenerationErrorKind::MissingCredentials(
                    format!("{} not set", api_key_env),
                ))
            })?;

        Self::with_api_key(api_key, model.as_ref().to_string(), base_url, timeout)
    }

    /// Creates a driver with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be initialized.
    #[instrument(skip(api_key), fields(model = %model))]
    pub fn with_api_key(
        api_key: String,
        model: String,
        base_url: &str,
        timeout: Duration,
    ) -> OpentaleResult<Self> {
        let inner = OpenAICompatibleClient::new(
            api_key,
            model,
            base_url,
            Self::provider_for(base_url),
            timeout,
        )
        .map_err(Self::convert_error)?;

        Ok(Self { inner })
    }

    fn provider_for(base_url: &str) -> &'static str {
        if base_url.contains("openrouter.ai") {
            "openrouter"
        } else if base_url.contains("api.openai.com") {
            "openai"
        } else if base_url.contains("groq.com") {
            "groq"
        } else {
            "openai-compatible"
        }
    }

    /// Converts OpenAICompatError to an upstream generation error.
    fn convert_error(error: OpenAICompatError) -> UpstreamGenerationError {
        let kind = match error {
            OpenAICompatError::Http(msg) => UpstreamGenerationErrorKind::Request(msg),
            OpenAICompatError::Api { status, message } => {
                UpstreamGenerationErrorKind::Api { status, message }
            }
            OpenAICompatError::EmptyResponse => UpstreamGenerationErrorKind::EmptyResponse,
            OpenAICompatError::StreamInterrupted(msg) => {
                UpstreamGenerationErrorKind::StreamInterrupted(msg)
            }
            OpenAICompatError::ResponseParsing(msg) => {
                UpstreamGenerationErrorKind::ResponseParsing(msg)
            }
            OpenAICompatError::Builder(msg) => {
                UpstreamGenerationErrorKind::Request(format!("Builder error: {}", msg))
            }
        };

        UpstreamGenerationError::new(kind)
    }
}

#[async_trait]
impl GenerationService for ChatCompletionsDriver {
    #[instrument(skip_all, fields(provider = self.inner.provider_name(), model = %self.inner.model_name()))]
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> OpentaleResult<String> {
        let reply = self
            .inner
            .complete(system_prompt, messages, params)
            .await
            .map_err(Self::convert_error)?;
        debug!(chars = reply.len(), "Completion received");
        Ok(reply)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[async_trait]
impl Streaming for ChatCompletionsDriver {
    #[instrument(skip_all, fields(provider = self.inner.provider_name(), model = %self.inner.model_name()))]
    async fn stream(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> OpentaleResult<ChunkStream> {
        let stream = self
            .inner
            .stream(system_prompt, messages, params)
            .await
            .map_err(Self::convert_error)?;

        Ok(Box::pin(
            stream.map(|chunk| chunk.map_err(|e| OpentaleError::from(Self::convert_error(e)))),
        ))
    }
}
