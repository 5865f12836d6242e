#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics snapshot and trend types.
//!
//! A [`StatisticsSnapshot`] is a pure function of a window of readings. It
//! has no identity and is never persisted; it is recomputed on demand.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use weather_insights_reading_models::Reading;

/// Direction of temperature movement across a window.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trend {
    /// The recent half of the window is warmer.
    Up,
    /// The recent half of the window is colder.
    Down,
    /// No movement beyond the noise threshold.
    Stable,
}

/// Order in which a window's readings are supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowOrder {
    /// Most recent reading first (the order reading stores return).
    NewestFirst,
    /// Chronological order.
    OldestFirst,
}

/// Aggregate temperature statistics for one location's window.
///
/// The numeric fields are `None` when the window was empty; callers should
/// treat that as "no data" and not display an average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    /// Location the window belongs to.
    pub location_id: String,
    /// Most recent reading in the window.
    pub current: Option<Reading>,
    /// Arithmetic mean temperature.
    pub avg_temperature: Option<f64>,
    /// Highest temperature.
    pub max_temperature: Option<f64>,
    /// Lowest temperature.
    pub min_temperature: Option<f64>,
    /// Temperature trend across the window.
    pub trend: Trend,
    /// Number of readings the snapshot was computed from.
    pub sample_count: usize,
}

impl StatisticsSnapshot {
    /// Snapshot for a location with no readings in the window.
    #[must_use]
    pub const fn empty(location_id: String) -> Self {
        Self {
            location_id,
            current: None,
            avg_temperature: None,
            max_temperature: None,
            min_temperature: None,
            trend: Trend::Stable,
            sample_count: 0,
        }
    }

    /// Returns `true` if the snapshot was computed from at least one reading.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.sample_count > 0
    }
}
