//! In-process stores backed by `tokio` read-write locks.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use weather_insights_insight_models::{Insight, NewInsight};
use weather_insights_reading_models::{NewReading, Reading};

use crate::{InsightStore, ReadingStore, StoreError};

/// Append-only in-memory [`ReadingStore`].
#[derive(Debug, Default)]
pub struct MemoryReadingStore {
    readings: RwLock<Vec<Reading>>,
}

impl MemoryReadingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and appends a reading, assigning a uuid v4 id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidReading`] if any numeric field is not
    /// finite. Nothing is stored in that case.
    pub async fn insert(&self, reading: NewReading) -> Result<Reading, StoreError> {
        reading.validate()?;

        let reading = reading.into_reading(uuid::Uuid::new_v4().to_string());
        self.readings.write().await.push(reading.clone());

        log::debug!(
            "Stored reading {} for {} at {}",
            reading.id,
            reading.location_id,
            reading.timestamp
        );

        Ok(reading)
    }

    /// Distinct location ids in first-seen order.
    pub async fn locations(&self) -> Vec<String> {
        let readings = self.readings.read().await;
        let mut locations: Vec<String> = Vec::new();
        for reading in readings.iter() {
            if !locations.contains(&reading.location_id) {
                locations.push(reading.location_id.clone());
            }
        }
        locations
    }
}

#[async_trait::async_trait]
impl ReadingStore for MemoryReadingStore {
    async fn find_window(
        &self,
        location_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Reading>, StoreError> {
        let readings = self.readings.read().await;

        let mut window: Vec<Reading> = readings
            .iter()
            .filter(|r| {
                r.location_id == location_id && r.timestamp >= since && r.timestamp <= until
            })
            .cloned()
            .collect();
        window.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        window.truncate(limit);

        Ok(window)
    }
}

/// Append-only in-memory [`InsightStore`].
#[derive(Debug, Default)]
pub struct MemoryInsightStore {
    insights: RwLock<Vec<Insight>>,
}

impl MemoryInsightStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored insight in insertion order.
    pub async fn all(&self) -> Vec<Insight> {
        self.insights.read().await.clone()
    }
}

#[async_trait::async_trait]
impl InsightStore for MemoryInsightStore {
    async fn create(&self, insight: NewInsight) -> Result<Insight, StoreError> {
        let insight = insight.with_id(uuid::Uuid::new_v4().to_string());
        self.insights.write().await.push(insight.clone());
        Ok(insight)
    }

    async fn find_recent(
        &self,
        location_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Insight>, StoreError> {
        let insights = self.insights.read().await;

        // Walk newest-inserted first so the stable sort breaks timestamp
        // ties in favour of the later write.
        let mut recent: Vec<Insight> = insights
            .iter()
            .rev()
            .filter(|i| location_id.is_none_or(|loc| i.location_id == loc))
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        recent.truncate(limit);

        Ok(recent)
    }
}
