//! LLM provider abstraction and implementations.
//!
//! Supports Anthropic Claude and `OpenAI` (plus compatible servers) via a
//! common trait, so the insight generator can be driven by a stub in tests.

pub mod anthropic;
pub mod openai;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{AiConfig, AiError, ProviderKind};

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role: "user" or "assistant".
    pub role: String,
    /// Message text.
    pub content: String,
}

impl Message {
    /// A user-authored message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from the LLM provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    /// Concatenated text of the response.
    pub text: String,
    /// Why the model stopped generating.
    pub stop_reason: StopReason,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Model finished its response naturally.
    EndTurn,
    /// Maximum tokens reached; the text is truncated.
    MaxTokens,
}

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails or the response cannot be
    /// decoded.
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        max_tokens: u32,
    ) -> Result<LlmResponse, AiError>;
}

/// Creates the provider described by `config`.
///
/// Returns `Ok(None)` when no provider is configured; the generator then
/// uses the rule-based fallback for every reading.
///
/// # Errors
///
/// Returns [`AiError::Config`] if the configured provider is missing its
/// API key.
pub fn create_provider(config: &AiConfig) -> Result<Option<Arc<dyn LlmProvider>>, AiError> {
    let Some(kind) = config.provider else {
        log::warn!(
            "No AI credentials detected. Set one of: ANTHROPIC_API_KEY, OPENAI_API_KEY, \
             or AI_BASE_URL. Insights will use the rule-based fallback."
        );
        return Ok(None);
    };

    match kind {
        ProviderKind::Anthropic => {
            let api_key = config.api_key.clone().ok_or_else(|| AiError::Config {
                message: "ANTHROPIC_API_KEY environment variable not set".to_string(),
            })?;
            let model = config
                .model
                .clone()
                .unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string());
            let mut provider = anthropic::AnthropicProvider::new(api_key, model);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url);
            }
            Ok(Some(Arc::new(provider)))
        }
        ProviderKind::OpenAi => {
            // Self-hosted compatible servers usually need no key.
            if config.api_key.is_none() && config.base_url.is_none() {
                return Err(AiError::Config {
                    message: "OPENAI_API_KEY environment variable not set".to_string(),
                });
            }
            let model = config
                .model
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_MODEL.to_string());
            let mut provider = openai::OpenAiProvider::new(config.api_key.clone(), model);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url);
            }
            Ok(Some(Arc::new(provider)))
        }
    }
}
