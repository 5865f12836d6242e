#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Store interfaces consumed by the insight pipeline.
//!
//! The pipeline never owns storage. It reads windows of readings through
//! [`ReadingStore`] and persists generated insights through
//! [`InsightStore`]. Implementations provide their own concurrency safety;
//! the pipeline only needs append-only writes and ordered reads.
//!
//! [`memory`] holds in-process implementations used by the CLI and tests.

pub mod memory;

use chrono::{DateTime, Utc};
use thiserror::Error;
use weather_insights_insight_models::{Insight, NewInsight};
use weather_insights_reading_models::{InvalidReadingError, Reading};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not serve the request.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of what went wrong.
        message: String,
    },

    /// A reading was rejected at ingestion.
    #[error(transparent)]
    InvalidReading(#[from] InvalidReadingError),
}

/// Read access to ingested readings.
#[async_trait::async_trait]
pub trait ReadingStore: Send + Sync {
    /// Returns up to `limit` readings for `location_id` taken in
    /// `[since, until]`, newest first.
    ///
    /// The bounds are applied before the limit, so readings newer than
    /// `until` never push older ones out of the window.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be queried.
    async fn find_window(
        &self,
        location_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Reading>, StoreError>;
}

/// Durable storage for generated insights.
#[async_trait::async_trait]
pub trait InsightStore: Send + Sync {
    /// Persists an insight, assigning its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the write fails.
    async fn create(&self, insight: NewInsight) -> Result<Insight, StoreError>;

    /// Returns up to `limit` insights, newest `generated_at` first,
    /// optionally restricted to one location.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be queried.
    async fn find_recent(
        &self,
        location_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Insight>, StoreError>;
}
