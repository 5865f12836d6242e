//! Handle to one in-flight pipeline invocation.

use tokio::task::JoinHandle;
use weather_insights_ai::generator::Cancellation;
use weather_insights_insight_models::Insight;

use crate::PipelineError;

/// A spawned pipeline invocation.
///
/// Dropping the handle detaches the task; it still runs to completion and
/// logs its own failures.
#[derive(Debug)]
pub struct PipelineTask {
    reading_id: String,
    handle: JoinHandle<Result<Insight, PipelineError>>,
    cancellation: Cancellation,
}

impl PipelineTask {
    pub(crate) const fn new(
        reading_id: String,
        handle: JoinHandle<Result<Insight, PipelineError>>,
        cancellation: Cancellation,
    ) -> Self {
        Self {
            reading_id,
            handle,
            cancellation,
        }
    }

    /// Id of the reading being processed.
    #[must_use]
    pub fn reading_id(&self) -> &str {
        &self.reading_id
    }

    /// Cancels the whole invocation.
    ///
    /// Nothing is persisted unless persisting has already begun, in which
    /// case the insight is still written.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Abandons only the in-flight primary call; the fallback still runs
    /// and persists.
    pub fn skip_primary(&self) {
        self.cancellation.skip_primary();
    }

    /// Waits for the invocation's result.
    ///
    /// # Errors
    ///
    /// Returns the invocation's [`PipelineError`], or
    /// [`PipelineError::Join`] if the task panicked.
    pub async fn join(self) -> Result<Insight, PipelineError> {
        self.handle.await?
    }
}
