//! Insight generation with automatic fallback.
//!
//! [`InsightGenerator::generate_insight`] makes a single bounded attempt on
//! the primary provider. Any failure (missing provider, timeout, transport or
//! quota error, malformed or empty response) is reported as a typed
//! [`PrimaryOutcome::Unavailable`] and handled by the rule-based
//! [`fallback`](crate::fallback). Exactly one insight is persisted per call.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use weather_insights_insight_models::{Insight, InsightOrigin, NewInsight};
use weather_insights_reading_models::Reading;
use weather_insights_store::{InsightStore, StoreError};

use crate::providers::{self, LlmProvider, Message, StopReason};
use crate::{AiConfig, AiError, InsightLanguage, fallback, prompt};

/// Why the primary generator produced no usable text.
#[derive(Debug, Error)]
pub enum PrimaryFailure {
    /// No provider is configured.
    #[error("no primary provider configured")]
    NotConfigured,

    /// The provider did not answer within the timeout.
    #[error("primary provider timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered with no text.
    #[error("primary provider returned an empty response")]
    EmptyResponse,

    /// The call was cancelled before it finished.
    #[error("primary call cancelled")]
    Cancelled,

    /// Transport, quota, auth or decoding failure.
    #[error(transparent)]
    Provider(#[from] AiError),
}

/// Result of one primary attempt.
#[derive(Debug)]
pub enum PrimaryOutcome {
    /// Usable, non-empty text.
    Generated(String),
    /// The primary path is unavailable for this reading.
    Unavailable(PrimaryFailure),
}

/// Errors surfaced by [`InsightGenerator`].
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Persisting the insight failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The invocation was cancelled before persisting began; nothing was
    /// written.
    #[error("insight generation cancelled")]
    Cancelled,
}

/// Cancellation handles for one generation.
///
/// [`Self::cancel`] abandons the whole invocation: nothing is persisted
/// unless persisting has already begun. [`Self::skip_primary`] only
/// abandons the primary call, so the fallback still runs and persists.
#[derive(Debug, Clone)]
pub struct Cancellation {
    invocation: CancellationToken,
    primary: CancellationToken,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    /// Creates fresh, uncancelled handles.
    #[must_use]
    pub fn new() -> Self {
        let invocation = CancellationToken::new();
        let primary = invocation.child_token();
        Self {
            invocation,
            primary,
        }
    }

    /// Cancels the whole invocation (and with it the primary call).
    pub fn cancel(&self) {
        self.invocation.cancel();
    }

    /// Cancels only the in-flight primary call.
    pub fn skip_primary(&self) {
        self.primary.cancel();
    }

    /// Whether the whole invocation was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.invocation.is_cancelled()
    }

    /// Token that fires when the invocation is cancelled.
    #[must_use]
    pub const fn invocation_token(&self) -> &CancellationToken {
        &self.invocation
    }
}

/// Produces and persists one insight per reading.
pub struct InsightGenerator {
    provider: Option<Arc<dyn LlmProvider>>,
    store: Arc<dyn InsightStore>,
    timeout: Duration,
    max_tokens: u32,
    history_limit: usize,
    language: InsightLanguage,
}

impl InsightGenerator {
    /// Creates a generator with an explicit provider (or none).
    #[must_use]
    pub fn new(
        config: &AiConfig,
        provider: Option<Arc<dyn LlmProvider>>,
        store: Arc<dyn InsightStore>,
    ) -> Self {
        Self {
            provider,
            store,
            timeout: config.timeout(),
            max_tokens: config.max_tokens,
            history_limit: config.history_limit,
            language: config.language,
        }
    }

    /// Creates a generator whose provider is built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if the configured provider lacks
    /// credentials.
    pub fn from_config(config: &AiConfig, store: Arc<dyn InsightStore>) -> Result<Self, AiError> {
        let provider = providers::create_provider(config)?;
        Ok(Self::new(config, provider, store))
    }

    /// Whether a primary provider is configured.
    #[must_use]
    pub fn has_primary(&self) -> bool {
        self.provider.is_some()
    }

    /// Generates and persists an insight for `reading`.
    ///
    /// `window` is the location's recent history used as prompt context.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Store`] if the insight cannot be persisted.
    /// Primary-path failures are never returned; they select the fallback.
    pub async fn generate_insight(
        &self,
        reading: &Reading,
        window: &[Reading],
    ) -> Result<Insight, GenerateError> {
        self.generate_insight_cancellable(reading, window, &Cancellation::new())
            .await
    }

    /// Same as [`Self::generate_insight`], observing `cancel`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Cancelled`] if the invocation was cancelled
    /// before persisting began, or [`GenerateError::Store`] if the insight
    /// cannot be persisted.
    pub async fn generate_insight_cancellable(
        &self,
        reading: &Reading,
        window: &[Reading],
        cancel: &Cancellation,
    ) -> Result<Insight, GenerateError> {
        let outcome = self.attempt_primary(reading, window, &cancel.primary).await;

        if cancel.is_cancelled() {
            log::debug!(
                "Insight generation for reading {} cancelled before persisting",
                reading.id
            );
            return Err(GenerateError::Cancelled);
        }

        // Past this point the invocation always persists.
        let (text, origin) = match outcome {
            PrimaryOutcome::Generated(text) => (text, InsightOrigin::Primary),
            PrimaryOutcome::Unavailable(reason) => {
                match &reason {
                    PrimaryFailure::NotConfigured => {}
                    other => log::warn!(
                        "Primary generator unavailable for reading {}: {other}",
                        reading.id
                    ),
                }
                log::info!(
                    "Using rule-based insight for reading {} ({})",
                    reading.id,
                    reading.location_id
                );
                (
                    fallback::fallback_insight(reading, self.language),
                    InsightOrigin::Fallback,
                )
            }
        };

        let insight = self
            .store
            .create(NewInsight {
                location_id: reading.location_id.clone(),
                text,
                source_reading_id: reading.id.clone(),
                generated_at: chrono::Utc::now(),
                origin,
            })
            .await?;

        log::debug!(
            "Persisted {} insight {} for reading {}",
            insight.origin,
            insight.id,
            reading.id
        );

        Ok(insight)
    }

    /// Makes one bounded attempt on the primary provider.
    pub async fn attempt_primary(
        &self,
        reading: &Reading,
        window: &[Reading],
        cancel: &CancellationToken,
    ) -> PrimaryOutcome {
        let Some(provider) = &self.provider else {
            return PrimaryOutcome::Unavailable(PrimaryFailure::NotConfigured);
        };

        let system_prompt = prompt::build_system_prompt(self.language);
        let messages = [Message::user(prompt::build_insight_prompt(
            reading,
            window,
            self.history_limit,
        ))];

        let call = tokio::time::timeout(
            self.timeout,
            provider.chat(&system_prompt, &messages, self.max_tokens),
        );

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return PrimaryOutcome::Unavailable(PrimaryFailure::Cancelled);
            }
            result = call => result,
        };

        match result {
            Err(_elapsed) => PrimaryOutcome::Unavailable(PrimaryFailure::Timeout(self.timeout)),
            Ok(Err(e)) => PrimaryOutcome::Unavailable(PrimaryFailure::Provider(e)),
            Ok(Ok(response)) => {
                let text = response.text.trim();
                if text.is_empty() {
                    return PrimaryOutcome::Unavailable(PrimaryFailure::EmptyResponse);
                }
                if response.stop_reason == StopReason::MaxTokens {
                    log::debug!(
                        "Primary insight for reading {} hit the {}-token limit",
                        reading.id,
                        self.max_tokens
                    );
                }
                PrimaryOutcome::Generated(text.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{Duration as ChronoDuration, TimeZone as _, Utc};
    use tokio::sync::Notify;
    use weather_insights_store::memory::MemoryInsightStore;

    use super::*;
    use crate::providers::LlmResponse;

    enum Script {
        Text(&'static str),
        Fail,
        Hang,
    }

    struct ScriptedProvider {
        script: Script,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn chat(
            &self,
            _system_prompt: &str,
            messages: &[Message],
            _max_tokens: u32,
        ) -> Result<LlmResponse, AiError> {
            self.prompts
                .lock()
                .unwrap()
                .push(messages[0].content.clone());
            match self.script {
                Script::Text(text) => Ok(LlmResponse {
                    text: text.to_string(),
                    stop_reason: StopReason::EndTurn,
                }),
                Script::Fail => Err(AiError::Provider {
                    message: "quota exceeded".to_string(),
                }),
                Script::Hang => std::future::pending().await,
            }
        }
    }

    /// Insight store whose writes block until released.
    struct GatedStore {
        inner: MemoryInsightStore,
        entered: Notify,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl InsightStore for GatedStore {
        async fn create(&self, insight: NewInsight) -> Result<Insight, StoreError> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.create(insight).await
        }

        async fn find_recent(
            &self,
            location_id: Option<&str>,
            limit: usize,
        ) -> Result<Vec<Insight>, StoreError> {
            self.inner.find_recent(location_id, limit).await
        }
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl InsightStore for BrokenStore {
        async fn create(&self, _insight: NewInsight) -> Result<Insight, StoreError> {
            Err(StoreError::Unavailable {
                message: "disk full".to_string(),
            })
        }

        async fn find_recent(
            &self,
            _location_id: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<Insight>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn reading(temperature: f64, humidity_pct: f64, condition: &str) -> Reading {
        Reading {
            id: "r-42".to_string(),
            location_id: "Salvador".to_string(),
            country: Some("BR".to_string()),
            timestamp: Utc.with_ymd_and_hms(2024, 2, 1, 15, 0, 0).unwrap(),
            temperature,
            feels_like: temperature,
            humidity_pct,
            pressure: 1011.0,
            wind_speed: 3.0,
            wind_direction: 90.0,
            condition_code: condition.to_string(),
            condition_text: condition.to_string(),
            cloudiness_pct: 20.0,
            visibility: 10_000.0,
            sunrise: None,
            sunset: None,
        }
    }

    fn config(timeout_ms: u64) -> AiConfig {
        AiConfig {
            timeout_ms,
            ..AiConfig::default()
        }
    }

    fn generator(
        provider: Option<Arc<dyn LlmProvider>>,
        store: Arc<dyn InsightStore>,
    ) -> InsightGenerator {
        InsightGenerator::new(&config(200), provider, store)
    }

    #[tokio::test]
    async fn primary_success_is_persisted_as_primary() {
        let store = Arc::new(MemoryInsightStore::new());
        let provider = ScriptedProvider::new(Script::Text("  Hot and sticky. Drink water.\n"));
        let generator = generator(Some(provider.clone()), store.clone());

        let r = reading(32.0, 85.0, "light rain");
        let insight = generator.generate_insight(&r, &[]).await.unwrap();

        assert_eq!(insight.origin, InsightOrigin::Primary);
        assert_eq!(insight.text, "Hot and sticky. Drink water.");
        assert_eq!(insight.source_reading_id, "r-42");
        assert_eq!(insight.location_id, "Salvador");
        assert_eq!(store.all().await, vec![insight]);
        assert!(provider.prompts.lock().unwrap()[0].contains("Location: Salvador"));
    }

    #[tokio::test]
    async fn provider_error_falls_back() {
        let store = Arc::new(MemoryInsightStore::new());
        let generator = generator(Some(ScriptedProvider::new(Script::Fail)), store.clone());

        let r = reading(32.0, 85.0, "light rain");
        let insight = generator.generate_insight(&r, &[]).await.unwrap();

        assert_eq!(insight.origin, InsightOrigin::Fallback);
        assert_eq!(
            insight.text,
            fallback::fallback_insight(&r, InsightLanguage::English)
        );
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn timeout_falls_back() {
        let store = Arc::new(MemoryInsightStore::new());
        let generator = InsightGenerator::new(
            &config(20),
            Some(ScriptedProvider::new(Script::Hang)),
            store.clone(),
        );

        let r = reading(10.0, 40.0, "clear");
        let outcome = generator
            .attempt_primary(&r, &[], &CancellationToken::new())
            .await;
        assert!(matches!(
            outcome,
            PrimaryOutcome::Unavailable(PrimaryFailure::Timeout(_))
        ));

        let insight = generator.generate_insight(&r, &[]).await.unwrap();
        assert_eq!(insight.origin, InsightOrigin::Fallback);
        assert_eq!(insight.text, fallback::messages(InsightLanguage::English).cold);
    }

    #[tokio::test]
    async fn empty_response_falls_back() {
        let store = Arc::new(MemoryInsightStore::new());
        let generator = generator(Some(ScriptedProvider::new(Script::Text(" \n "))), store);

        let r = reading(22.0, 50.0, "clear");
        assert!(matches!(
            generator
                .attempt_primary(&r, &[], &CancellationToken::new())
                .await,
            PrimaryOutcome::Unavailable(PrimaryFailure::EmptyResponse)
        ));

        let insight = generator.generate_insight(&r, &[]).await.unwrap();
        assert_eq!(insight.origin, InsightOrigin::Fallback);
        assert_eq!(
            insight.text,
            fallback::messages(InsightLanguage::English).pleasant
        );
    }

    #[tokio::test]
    async fn missing_provider_uses_fallback() {
        let store = Arc::new(MemoryInsightStore::new());
        let generator = generator(None, store);
        assert!(!generator.has_primary());

        let insight = generator
            .generate_insight(&reading(31.0, 20.0, "Clear"), &[])
            .await
            .unwrap();
        assert_eq!(insight.origin, InsightOrigin::Fallback);
    }

    #[tokio::test]
    async fn prompt_history_is_capped() {
        let store = Arc::new(MemoryInsightStore::new());
        let provider = ScriptedProvider::new(Script::Text("ok"));
        let generator = generator(Some(provider.clone()), store);

        let current = reading(25.0, 60.0, "Clouds");
        let window: Vec<Reading> = (0..40)
            .map(|h| Reading {
                id: format!("h-{h}"),
                timestamp: current.timestamp - ChronoDuration::hours(h),
                ..current.clone()
            })
            .collect();

        generator.generate_insight(&current, &window).await.unwrap();

        let prompts = provider.prompts.lock().unwrap();
        let history_lines = prompts[0]
            .lines()
            .filter(|l| l.starts_with("- 2024-"))
            .count();
        assert_eq!(history_lines, 24);
    }

    #[tokio::test]
    async fn repeated_calls_are_not_deduplicated() {
        let store = Arc::new(MemoryInsightStore::new());
        let generator = generator(None, store.clone());
        let r = reading(22.0, 50.0, "clear");

        generator.generate_insight(&r, &[]).await.unwrap();
        generator.generate_insight(&r, &[]).await.unwrap();

        let all = store.all().await;
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|i| i.source_reading_id == "r-42"));
        assert_ne!(all[0].id, all[1].id);
    }

    #[tokio::test]
    async fn store_failure_is_surfaced() {
        let generator = generator(None, Arc::new(BrokenStore));
        assert!(matches!(
            generator
                .generate_insight(&reading(22.0, 50.0, "clear"), &[])
                .await,
            Err(GenerateError::Store(StoreError::Unavailable { .. }))
        ));
    }

    #[tokio::test]
    async fn cancel_before_fallback_persists_nothing() {
        let store = Arc::new(MemoryInsightStore::new());
        let generator = Arc::new(generator(
            Some(ScriptedProvider::new(Script::Hang)),
            store.clone(),
        ));
        let cancel = Cancellation::new();

        let task = tokio::spawn({
            let generator = generator.clone();
            let cancel = cancel.clone();
            async move {
                generator
                    .generate_insight_cancellable(&reading(22.0, 50.0, "clear"), &[], &cancel)
                    .await
            }
        });

        cancel.cancel();

        assert!(matches!(
            task.await.unwrap(),
            Err(GenerateError::Cancelled)
        ));
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn cancel_after_fallback_begins_still_persists() {
        let store = Arc::new(GatedStore {
            inner: MemoryInsightStore::new(),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let generator = Arc::new(generator(
            Some(ScriptedProvider::new(Script::Fail)),
            store.clone(),
        ));
        let cancel = Cancellation::new();

        let task = tokio::spawn({
            let generator = generator.clone();
            let cancel = cancel.clone();
            async move {
                generator
                    .generate_insight_cancellable(&reading(32.0, 85.0, "rain"), &[], &cancel)
                    .await
            }
        });

        store.entered.notified().await;
        cancel.cancel();
        store.release.notify_one();

        let insight = task.await.unwrap().unwrap();
        assert_eq!(insight.origin, InsightOrigin::Fallback);
        assert_eq!(store.inner.all().await.len(), 1);
    }

    #[tokio::test]
    async fn skipping_primary_runs_fallback() {
        let store = Arc::new(MemoryInsightStore::new());
        let generator = Arc::new(InsightGenerator::new(
            &config(60_000),
            Some(ScriptedProvider::new(Script::Hang)),
            store.clone(),
        ));
        let cancel = Cancellation::new();

        let task = tokio::spawn({
            let generator = generator.clone();
            let cancel = cancel.clone();
            async move {
                generator
                    .generate_insight_cancellable(&reading(22.0, 50.0, "clear"), &[], &cancel)
                    .await
            }
        });

        cancel.skip_primary();

        let insight = task.await.unwrap().unwrap();
        assert_eq!(insight.origin, InsightOrigin::Fallback);
        assert_eq!(store.all().await.len(), 1);
    }
}
