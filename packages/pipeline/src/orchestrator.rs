//! The pipeline orchestrator.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use weather_insights_ai::generator::{Cancellation, InsightGenerator};
use weather_insights_ai::{AiConfig, AiError};
use weather_insights_insight_models::Insight;
use weather_insights_reading_models::Reading;
use weather_insights_stats_models::{StatisticsSnapshot, WindowOrder};
use weather_insights_store::{InsightStore, ReadingStore};

use crate::{PipelineConfig, PipelineError, PipelineStage, PipelineTask};

/// Turns new readings into insights and answers statistics and insight
/// queries.
///
/// Cheap to clone; clones share the stores, the generator and the
/// in-flight limit.
#[derive(Clone)]
pub struct Orchestrator {
    readings: Arc<dyn ReadingStore>,
    insights: Arc<dyn InsightStore>,
    generator: Arc<InsightGenerator>,
    config: Arc<PipelineConfig>,
    permits: Arc<Semaphore>,
}

impl Orchestrator {
    /// Creates an orchestrator around an existing generator.
    ///
    /// `insights` should be the store `generator` persists to.
    #[must_use]
    pub fn new(
        config: PipelineConfig,
        readings: Arc<dyn ReadingStore>,
        insights: Arc<dyn InsightStore>,
        generator: InsightGenerator,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
        Self {
            readings,
            insights,
            generator: Arc::new(generator),
            config: Arc::new(config),
            permits,
        }
    }

    /// Creates an orchestrator whose generator is built from `ai`.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Config`] if the configured provider lacks
    /// credentials.
    pub fn from_config(
        ai: &AiConfig,
        config: PipelineConfig,
        readings: Arc<dyn ReadingStore>,
        insights: Arc<dyn InsightStore>,
    ) -> Result<Self, AiError> {
        let generator = InsightGenerator::from_config(ai, insights.clone())?;
        Ok(Self::new(config, readings, insights, generator))
    }

    /// Starts processing a newly ingested reading in the background.
    ///
    /// Returns immediately. The task waits for an in-flight slot, then runs
    /// [`Self::process_reading`]. Failures are logged by the task itself,
    /// so the handle may simply be dropped.
    pub fn on_new_reading(&self, reading: Reading) -> PipelineTask {
        let cancellation = Cancellation::new();
        let reading_id = reading.id.clone();

        let handle = tokio::spawn({
            let this = self.clone();
            let cancellation = cancellation.clone();
            async move {
                let result = this.run_bounded(&reading, &cancellation).await;

                match &result {
                    Ok(_) => {}
                    Err(PipelineError::Cancelled) => {
                        log::debug!("Pipeline for reading {} cancelled", reading.id);
                    }
                    Err(e) => {
                        log::error!(
                            "Pipeline for reading {} ({}) failed: {e}",
                            reading.id,
                            reading.location_id
                        );
                    }
                }

                result
            }
        });

        PipelineTask::new(reading_id, handle, cancellation)
    }

    async fn run_bounded(
        &self,
        reading: &Reading,
        cancel: &Cancellation,
    ) -> Result<Insight, PipelineError> {
        let _permit = tokio::select! {
            biased;
            () = cancel.invocation_token().cancelled() => return Err(PipelineError::Cancelled),
            permit = self.permits.acquire() => permit.map_err(|_| PipelineError::Cancelled)?,
        };

        self.process_reading(reading, cancel).await
    }

    /// Runs the pipeline for one reading in the current task.
    ///
    /// # Errors
    ///
    /// * [`PipelineError::InvalidReading`] if a numeric field is not finite
    /// * [`PipelineError::Store`] if history cannot be read or the insight
    ///   cannot be written
    /// * [`PipelineError::Cancelled`] if `cancel` fired before persisting
    pub async fn process_reading(
        &self,
        reading: &Reading,
        cancel: &Cancellation,
    ) -> Result<Insight, PipelineError> {
        log_stage(reading, PipelineStage::Received);
        reading.validate()?;

        let since = reading.timestamp - self.config.insight_lookback();
        let mut window = self
            .readings
            .find_window(
                &reading.location_id,
                since,
                reading.timestamp,
                self.config.insight_window_limit + 1,
            )
            .await?;
        window.retain(|r| r.id != reading.id);
        window.truncate(self.config.insight_window_limit);

        let snapshot = weather_insights_stats::compute_statistics_with_epsilon(
            &reading.location_id,
            &window,
            WindowOrder::NewestFirst,
            self.config.trend_epsilon,
        );
        log_stage(reading, PipelineStage::StatsComputed);
        log::trace!(
            "History for {}: {} readings, trend {}",
            reading.location_id,
            snapshot.sample_count,
            snapshot.trend
        );

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let insight = self
            .generator
            .generate_insight_cancellable(reading, &window, cancel)
            .await?;
        log_stage(reading, PipelineStage::InsightAttempted(insight.origin));
        log_stage(reading, PipelineStage::Persisted);

        Ok(insight)
    }

    /// Statistics for `location_id` over the configured lookback ending
    /// now.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] if the reading store fails.
    pub async fn get_statistics(
        &self,
        location_id: &str,
    ) -> Result<StatisticsSnapshot, PipelineError> {
        self.get_statistics_at(location_id, Utc::now()).await
    }

    /// Statistics for `location_id` over the configured lookback ending at
    /// `as_of`. Useful when replaying historical feeds.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] if the reading store fails.
    pub async fn get_statistics_at(
        &self,
        location_id: &str,
        as_of: DateTime<Utc>,
    ) -> Result<StatisticsSnapshot, PipelineError> {
        let since = as_of - self.config.stats_lookback();
        let window = self
            .readings
            .find_window(location_id, since, as_of, self.config.stats_window_limit)
            .await?;

        Ok(weather_insights_stats::compute_statistics_with_epsilon(
            location_id,
            &window,
            WindowOrder::NewestFirst,
            self.config.trend_epsilon,
        ))
    }

    /// Most recent insights, newest first, at most
    /// [`PipelineConfig::recent_insights_limit`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] if the insight store fails.
    pub async fn get_recent_insights(
        &self,
        location_id: Option<&str>,
    ) -> Result<Vec<Insight>, PipelineError> {
        let limit = self.config.recent_insights_limit;
        let mut insights = self.insights.find_recent(location_id, limit).await?;
        insights.truncate(limit);
        Ok(insights)
    }
}

fn log_stage(reading: &Reading, stage: PipelineStage) {
    log::debug!(
        "Reading {} ({}): {stage}",
        reading.id,
        reading.location_id
    );
}
