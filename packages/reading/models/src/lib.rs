#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Environmental reading types shared across the insight pipeline.
//!
//! A [`Reading`] is one timestamped measurement for a named location. It is
//! created by ingestion and never mutated afterwards. [`NewReading`] is the
//! shape that arrives from the collector queue before a store assigns an id,
//! and accepts the collector's field names (`city`, `weather_condition`,
//! ...) so a raw feed can be replayed as-is.

pub mod timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a reading carries a non-finite numeric field.
///
/// Readings are rejected with this error before they reach the statistics
/// aggregator or the insight generator, which both assume clean numbers.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid reading: field `{field}` is not a finite number ({value})")]
pub struct InvalidReadingError {
    /// Name of the offending field.
    pub field: &'static str,
    /// The rejected value.
    pub value: f64,
}

/// One immutable environmental measurement for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Store-assigned identifier.
    pub id: String,
    /// Location (city) this reading was taken for.
    pub location_id: String,
    /// Country code reported by the collector, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// When the measurement was taken.
    pub timestamp: DateTime<Utc>,
    /// Air temperature in °C.
    pub temperature: f64,
    /// Apparent temperature in °C.
    pub feels_like: f64,
    /// Relative humidity, 0-100.
    pub humidity_pct: f64,
    /// Atmospheric pressure in hPa.
    pub pressure: f64,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Wind direction in degrees.
    pub wind_direction: f64,
    /// Short condition code (e.g. `Rain`, `Clear`).
    pub condition_code: String,
    /// Human-readable condition description (e.g. `light rain`).
    pub condition_text: String,
    /// Cloud cover, 0-100.
    pub cloudiness_pct: f64,
    /// Visibility in metres.
    pub visibility: f64,
    /// Local sunrise, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<DateTime<Utc>>,
    /// Local sunset, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset: Option<DateTime<Utc>>,
}

impl Reading {
    /// Checks that every numeric field is finite.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReadingError`] naming the first non-finite field.
    pub fn validate(&self) -> Result<(), InvalidReadingError> {
        check_finite(&[
            ("temperature", self.temperature),
            ("feelsLike", self.feels_like),
            ("humidityPct", self.humidity_pct),
            ("pressure", self.pressure),
            ("windSpeed", self.wind_speed),
            ("windDirection", self.wind_direction),
            ("cloudinessPct", self.cloudiness_pct),
            ("visibility", self.visibility),
        ])
    }

    /// Returns `true` if the condition code or description mentions rain.
    ///
    /// The match is a case-insensitive substring search, so `Rain`,
    /// `light rain` and `Thunderstorm with RAIN` all qualify.
    #[must_use]
    pub fn indicates_rain(&self) -> bool {
        const RAIN_MARKER: &str = "rain";

        self.condition_code.to_lowercase().contains(RAIN_MARKER)
            || self.condition_text.to_lowercase().contains(RAIN_MARKER)
    }
}

/// A reading as received from the collector, before a store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReading {
    /// Location (city) this reading was taken for.
    #[serde(alias = "city")]
    pub location_id: String,
    /// Country code reported by the collector, if any.
    #[serde(default)]
    pub country: Option<String>,
    /// When the measurement was taken. Naive timestamps are read as UTC.
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Air temperature in °C.
    pub temperature: f64,
    /// Apparent temperature in °C.
    pub feels_like: f64,
    /// Relative humidity, 0-100.
    #[serde(alias = "humidity")]
    pub humidity_pct: f64,
    /// Atmospheric pressure in hPa.
    pub pressure: f64,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Wind direction in degrees.
    #[serde(default)]
    pub wind_direction: f64,
    /// Short condition code.
    #[serde(alias = "weather_condition")]
    pub condition_code: String,
    /// Human-readable condition description.
    #[serde(alias = "weather_description")]
    pub condition_text: String,
    /// Cloud cover, 0-100.
    #[serde(default, alias = "cloudiness")]
    pub cloudiness_pct: f64,
    /// Visibility in metres.
    #[serde(default)]
    pub visibility: f64,
    /// Local sunrise, if known.
    #[serde(default, with = "timestamp::option")]
    pub sunrise: Option<DateTime<Utc>>,
    /// Local sunset, if known.
    #[serde(default, with = "timestamp::option")]
    pub sunset: Option<DateTime<Utc>>,
}

impl NewReading {
    /// Checks that every numeric field is finite.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReadingError`] naming the first non-finite field.
    pub fn validate(&self) -> Result<(), InvalidReadingError> {
        check_finite(&[
            ("temperature", self.temperature),
            ("feelsLike", self.feels_like),
            ("humidityPct", self.humidity_pct),
            ("pressure", self.pressure),
            ("windSpeed", self.wind_speed),
            ("windDirection", self.wind_direction),
            ("cloudinessPct", self.cloudiness_pct),
            ("visibility", self.visibility),
        ])
    }

    /// Converts into a stored [`Reading`] with the given id.
    #[must_use]
    pub fn into_reading(self, id: String) -> Reading {
        Reading {
            id,
            location_id: self.location_id,
            country: self.country,
            timestamp: self.timestamp,
            temperature: self.temperature,
            feels_like: self.feels_like,
            humidity_pct: self.humidity_pct,
            pressure: self.pressure,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            condition_code: self.condition_code,
            condition_text: self.condition_text,
            cloudiness_pct: self.cloudiness_pct,
            visibility: self.visibility,
            sunrise: self.sunrise,
            sunset: self.sunset,
        }
    }
}

fn check_finite(fields: &[(&'static str, f64)]) -> Result<(), InvalidReadingError> {
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some(&(field, value)) => Err(InvalidReadingError { field, value }),
        None => Ok(()),
    }
}
