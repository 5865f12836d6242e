//! Explicit configuration for the insight generator.
//!
//! Credentials are read once, when an [`AiConfig`] is built, and handed to
//! the generator at construction. Nothing in this crate reads the process
//! environment afterwards, so tests can build generators with stub providers
//! without touching global state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::AiError;

/// Supported primary providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum ProviderKind {
    /// Anthropic Messages API.
    #[serde(alias = "claude")]
    #[strum(to_string = "anthropic", serialize = "claude")]
    Anthropic,
    /// `OpenAI` Chat Completions API, or a compatible server via `base_url`.
    #[serde(alias = "gpt")]
    #[strum(to_string = "openai", serialize = "gpt")]
    OpenAi,
}

/// Language the insight text is written in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum InsightLanguage {
    /// English.
    #[default]
    #[serde(alias = "en")]
    #[strum(to_string = "english", serialize = "en")]
    English,
    /// Brazilian Portuguese.
    #[serde(alias = "pt", alias = "pt-br")]
    #[strum(to_string = "portuguese", serialize = "pt", serialize = "pt-br")]
    Portuguese,
}

impl InsightLanguage {
    /// Human-readable name used in the system instruction.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Portuguese => "Brazilian Portuguese",
        }
    }
}

const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_HISTORY_LIMIT: usize = 24;

/// Primary generator settings.
///
/// Every field has a default, so a TOML `[ai]` table may be partial or
/// absent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AiConfig {
    /// Which provider to call. `None` disables the primary path.
    pub provider: Option<ProviderKind>,
    /// Provider API key.
    pub api_key: Option<String>,
    /// Model name; each provider has a default.
    pub model: Option<String>,
    /// Override for the provider's API root, e.g.
    /// `http://localhost:11434/v1` for a local `OpenAI`-compatible server.
    pub base_url: Option<String>,
    /// Upper bound on one primary call, in milliseconds.
    pub timeout_ms: u64,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// How many history entries the prompt may include.
    pub history_limit: usize,
    /// Language of the generated and fallback text.
    pub language: InsightLanguage,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: None,
            api_key: None,
            model: None,
            base_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_tokens: DEFAULT_MAX_TOKENS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            language: InsightLanguage::default(),
        }
    }
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_tokens", &self.max_tokens)
            .field("history_limit", &self.history_limit)
            .field("language", &self.language)
            .finish()
    }
}

impl AiConfig {
    /// Builds a configuration from process environment variables.
    ///
    /// If `AI_PROVIDER` is set, uses that provider. Otherwise auto-detects
    /// from available credentials (`ANTHROPIC_API_KEY`, then
    /// `OPENAI_API_KEY`, then `AI_BASE_URL` for a keyless local server).
    /// `AI_MODEL`, `AI_TIMEOUT_MS`, `AI_MAX_TOKENS` and `INSIGHT_LANGUAGE`
    /// override the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if a variable holds an unparsable value.
    pub fn from_env() -> Result<Self, AiError> {
        Self::from_lookup(|key: &str| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with a caller-supplied variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if a variable holds an unparsable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AiError> {
        let mut config = Self::default().with_credentials_from(&lookup)?;

        if let Some(ms) = lookup("AI_TIMEOUT_MS") {
            config.timeout_ms = parse_var("AI_TIMEOUT_MS", &ms)?;
        }
        if let Some(tokens) = lookup("AI_MAX_TOKENS") {
            config.max_tokens = parse_var("AI_MAX_TOKENS", &tokens)?;
        }
        if let Some(language) = lookup("INSIGHT_LANGUAGE") {
            config.language = parse_var("INSIGHT_LANGUAGE", &language)?;
        }

        Ok(config)
    }

    /// Fills provider, key, model and base URL from the process
    /// environment where this configuration leaves them unset.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if `AI_PROVIDER` names an unknown
    /// provider.
    pub fn with_env_credentials(self) -> Result<Self, AiError> {
        let env = |key: &str| std::env::var(key).ok();
        self.with_credentials_from(&env)
    }

    fn with_credentials_from(
        mut self,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AiError> {
        if self.base_url.is_none() {
            self.base_url = lookup("AI_BASE_URL");
        }
        if self.model.is_none() {
            self.model = lookup("AI_MODEL");
        }
        if self.provider.is_none() {
            self.provider = match lookup("AI_PROVIDER") {
                Some(name) => Some(parse_var("AI_PROVIDER", &name)?),
                None => detect_provider(lookup, self.base_url.is_some()),
            };
        }
        if self.api_key.is_none() {
            self.api_key = match self.provider {
                Some(ProviderKind::Anthropic) => lookup("ANTHROPIC_API_KEY"),
                Some(ProviderKind::OpenAi) => lookup("OPENAI_API_KEY"),
                None => None,
            };
        }

        Ok(self)
    }

    /// Primary call timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Picks a provider from whichever credential is present.
fn detect_provider(
    lookup: &impl Fn(&str) -> Option<String>,
    has_base_url: bool,
) -> Option<ProviderKind> {
    if lookup("ANTHROPIC_API_KEY").is_some() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return Some(ProviderKind::Anthropic);
    }

    if lookup("OPENAI_API_KEY").is_some() {
        log::info!("Auto-detected AI provider: OpenAI (OPENAI_API_KEY found)");
        return Some(ProviderKind::OpenAi);
    }

    if has_base_url {
        log::info!("Auto-detected AI provider: OpenAI-compatible server (AI_BASE_URL found)");
        return Some(ProviderKind::OpenAi);
    }

    None
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, AiError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| AiError::Config {
        message: format!("{name}={value:?} is not valid: {e}"),
    })
}
