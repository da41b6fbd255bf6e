//! Type conversions between OpenTale and OpenAI formats.

use crate::openai_compat::{ChatMessage, ChatRequest, ChatResponse, OpenAICompatError};
use opentale_core::{GenerationParams, Role};

/// Builds a chat request: system prompt first, then `messages` in order.
pub fn to_chat_request(
    system_prompt: &str,
    messages: &[opentale_core::ChatMessage],
    params: &GenerationParams,
    model: &str,
    stream: bool,
) -> Result<ChatRequest, OpenAICompatError> {
    let mut wire = Vec::with_capacity(messages.len() + 1);
    if !system_prompt.is_empty() {
        wire.push(ChatMessage {
            role: Role::System.to_string(),
            content: system_prompt.to_string(),
        });
    }
    wire.extend(messages.iter().map(|msg| ChatMessage {
        role: msg.role.to_string(),
        content: msg.content.clone(),
    }));

    let mut builder = ChatRequest::builder();
    builder
        .model(model.to_string())
        .messages(wire)
        .max_tokens(Some(*params.max_tokens()))
        .temperature(Some(*params.temperature()))
        .seed(*params.seed());

    if stream {
        builder.stream(Some(true));
    }

    builder
        .build()
        .map_err(|e| OpenAICompatError::Builder(format!("Failed to build request: {}", e)))
}

/// Extracts the reply text of the first choice.
pub fn from_chat_response(response: &ChatResponse) -> Result<String, OpenAICompatError> {
    let choice = response
        .choices
        .first()
        .ok_or_else(|| OpenAICompatError::ResponseParsing("No choices in response".to_string()))?;

    match choice.message.content.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(OpenAICompatError::EmptyResponse),
    }
}
