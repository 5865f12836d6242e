//! Orchestrator settings.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use weather_insights_stats::TREND_EPSILON_CELSIUS;

/// Window sizes, caps and concurrency limits for the [`Orchestrator`].
///
/// Every field has a default, so a TOML `[pipeline]` table may be partial
/// or absent.
///
/// [`Orchestrator`]: crate::Orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PipelineConfig {
    /// How far back, from the new reading's timestamp, history is gathered
    /// for the insight prompt.
    pub insight_lookback_hours: i64,
    /// Maximum readings fetched as insight history.
    pub insight_window_limit: usize,
    /// How far back statistics look.
    pub stats_lookback_hours: i64,
    /// Maximum readings fetched for statistics.
    pub stats_window_limit: usize,
    /// Maximum insights returned by recent-insight queries.
    pub recent_insights_limit: usize,
    /// Minimum half-window mean difference, in °C, before a trend is
    /// reported.
    pub trend_epsilon: f64,
    /// Maximum pipeline invocations running at once.
    pub max_in_flight: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            insight_lookback_hours: 7 * 24,
            insight_window_limit: 24,
            stats_lookback_hours: 24,
            stats_window_limit: 200,
            recent_insights_limit: 5,
            trend_epsilon: TREND_EPSILON_CELSIUS,
            max_in_flight: 16,
        }
    }
}

impl PipelineConfig {
    /// Insight history lookback as a [`Duration`].
    #[must_use]
    pub fn insight_lookback(&self) -> Duration {
        Duration::hours(self.insight_lookback_hours)
    }

    /// Statistics lookback as a [`Duration`].
    #[must_use]
    pub fn stats_lookback(&self) -> Duration {
        Duration::hours(self.stats_lookback_hours)
    }
}
