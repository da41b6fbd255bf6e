//! Generic client for OpenAI-compatible APIs.

use crate::openai_compat::{ChatResponse, OpenAICompatError, conversions, decode_sse_stream};
use futures_util::stream::Stream;
use opentale_core::{ChatMessage, GenerationParams};
use opentale_interface::StreamChunk;
use reqwest::Client;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Boxed stream of decoded chunks.
pub type CompatChunkStream =
    Pin<Box<dyn Stream<Item = Result<StreamChunk, OpenAICompatError>> + Send>>;

/// Generic client for any OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct OpenAICompatibleClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    provider_name: &'static str,
}

impl OpenAICompatibleClient {
    /// Creates a new OpenAI-compatible client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key for authentication
    /// * `model` - Model identifier
    /// * `base_url` - API root, e.g. `https://openrouter.ai/api/v1`
    /// * `provider_name` - Name of the provider (for logging/tracing)
    /// * `timeout` - Upper bound for one whole call, streaming included
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    #[instrument(skip(api_key), fields(provider = provider_name, model = %model))]
    pub fn new(
        api_key: String,
        model: String,
        base_url: &str,
        provider_name: &'static str,
        timeout: Duration,
    ) -> Result<Self, OpenAICompatError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpenAICompatError::Http(format!("Failed to build client: {}", e)))?;
        let endpoint = format!("{}/chat/completions", base_url.trim_end_matches('/'));

        debug!(
            provider = provider_name,
            model = %model,
            url = %endpoint,
            "Created OpenAI-compatible client"
        );

        Ok(Self {
            client,
            api_key,
            model,
            endpoint,
            provider_name,
        })
    }

    async fn send(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &GenerationParams,
        stream: bool,
    ) -> Result<reqwest::Response, OpenAICompatError> {
        let chat_request =
            conversions::to_chat_request(system_prompt, messages, params, &self.model, stream)?;

        debug!(
            provider = self.provider_name,
            model = %self.model,
            message_count = chat_request.messages().len(),
            stream,
            "Sending request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = self.provider_name, error = ?e, "HTTP request failed");
                OpenAICompatError::Http(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(
                provider = self.provider_name,
                status = %status,
                error = %error_text,
                "API error"
            );

            return Err(OpenAICompatError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }

    /// Generates a complete reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the response cannot be parsed,
    /// or it carries no text.
    #[instrument(skip_all, fields(provider = self.provider_name, model = %self.model))]
    pub async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, OpenAICompatError> {
        let response = self.send(system_prompt, messages, params, false).await?;

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = self.provider_name, error = ?e, "Failed to parse response");
            OpenAICompatError::ResponseParsing(format!("Failed to parse JSON: {}", e))
        })?;

        debug!(
            provider = self.provider_name,
            choices = chat_response.choices.len(),
            "Received response"
        );

        conversions::from_chat_response(&chat_response)
    }

    /// Starts a streaming reply.
    ///
    /// Dropping the returned stream drops the HTTP response, which aborts
    /// the call.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails before the body starts.
    #[instrument(skip_all, fields(provider = self.provider_name, model = %self.model))]
    pub async fn stream(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<CompatChunkStream, OpenAICompatError> {
        let response = self.send(system_prompt, messages, params, true).await?;
        debug!(provider = self.provider_name, "Stream opened");
        Ok(Box::pin(decode_sse_stream(Box::pin(response.bytes_stream()))))
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &'static str {
        self.provider_name
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Returns the chat completions URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = OpenAICompatibleClient::new(
            "key".to_string(),
            "model".to_string(),
            "https://openrouter.ai/api/v1/",
            "openrouter",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }
}
