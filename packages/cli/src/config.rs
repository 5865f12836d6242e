//! Configuration file loading.
//!
//! ```toml
//! [ai]
//! provider = "openai"
//! base_url = "http://localhost:11434/v1"
//! model = "llama3.1"
//! timeout_ms = 3000
//!
//! [pipeline]
//! recent_insights_limit = 10
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use weather_insights_ai::{AiConfig, AiError};
use weather_insights_pipeline::PipelineConfig;

/// Errors loading the CLI configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`AppConfig`].
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// An environment override was invalid.
    #[error(transparent)]
    Ai(#[from] AiError),
}

/// Everything the binary can be configured with.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Primary generator settings.
    pub ai: AiConfig,
    /// Orchestrator settings.
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Loads `path` if given, otherwise reads the AI settings from the
    /// environment. Credentials missing from the file are taken from the
    /// environment too.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or an
    /// environment variable is invalid.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self {
                ai: AiConfig::from_env()?,
                pipeline: PipelineConfig::default(),
            });
        };

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Self::parse(&text)?;
        config.ai = config.ai.with_env_credentials()?;
        log::debug!("Loaded configuration from {}: {config:?}", path.display());

        Ok(config)
    }

    fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}
