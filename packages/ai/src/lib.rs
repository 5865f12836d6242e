#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Insight generation for environmental readings.
//!
//! Supports Anthropic Claude, `OpenAI`, and any `OpenAI`-compatible
//! local/self-hosted server (Ollama, vLLM, llama.cpp, LM Studio) via
//! [`AiConfig::base_url`]. The [`generator::InsightGenerator`] asks the
//! configured provider for an analysis of a reading and its recent history.
//! When the provider is missing, slow, failing, or returns nothing, it
//! derives a deterministic insight from the reading alone (see
//! [`fallback`]). Either way exactly one insight is persisted per call.

pub mod config;
pub mod fallback;
pub mod generator;
pub mod prompt;
pub mod providers;

pub use config::{AiConfig, InsightLanguage, ProviderKind};

use thiserror::Error;

/// Errors that can occur while talking to an LLM provider.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}
