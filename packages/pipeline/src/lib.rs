#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pipeline orchestrator for newly ingested readings.
//!
//! Each reading moves through
//! `Received -> StatsComputed -> InsightAttempted -> Persisted`. The
//! [`Orchestrator`] runs every invocation as its own tokio task, bounded by
//! a semaphore so a burst of ingestion cannot open unbounded primary calls.
//! Callers get a [`PipelineTask`] handle back immediately and may drop it
//! (fire-and-forget), cancel it, or join it.

pub mod config;
pub mod orchestrator;
pub mod task;

use std::fmt;

pub use config::PipelineConfig;
pub use orchestrator::Orchestrator;
pub use task::PipelineTask;

use thiserror::Error;
use weather_insights_ai::generator::GenerateError;
use weather_insights_insight_models::InsightOrigin;
use weather_insights_reading_models::InvalidReadingError;
use weather_insights_store::StoreError;

/// Errors surfaced to callers of the [`Orchestrator`].
///
/// Primary generator failures never appear here; they are recovered by the
/// fallback.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The reading has a non-finite numeric field.
    #[error(transparent)]
    InvalidReading(#[from] InvalidReadingError),

    /// A reading or insight store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The invocation was cancelled before anything was persisted.
    #[error("pipeline invocation cancelled")]
    Cancelled,

    /// The background task panicked or was aborted.
    #[error("pipeline task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<GenerateError> for PipelineError {
    fn from(e: GenerateError) -> Self {
        match e {
            GenerateError::Store(e) => Self::Store(e),
            GenerateError::Cancelled => Self::Cancelled,
        }
    }
}

/// Where a reading is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// The reading was handed to the orchestrator.
    Received,
    /// Statistics over the location's history were computed.
    StatsComputed,
    /// An insight was produced by the given generator.
    InsightAttempted(InsightOrigin),
    /// The insight was written to the store.
    Persisted,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => f.write_str("received"),
            Self::StatsComputed => f.write_str("stats_computed"),
            Self::InsightAttempted(origin) => write!(f, "insight_attempted({origin})"),
            Self::Persisted => f.write_str("persisted"),
        }
    }
}
