#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics aggregator for windows of environmental readings.
//!
//! Computes current/average/min/max temperature and a three-way trend
//! classification. Everything here is a pure function of its input: no I/O,
//! no shared state, deterministic for a given window.
//!
//! # Trend definition
//!
//! The window is put in chronological order and split in two halves of
//! `len / 2` readings each. When the length is odd the middle reading
//! belongs to neither half. The trend is [`Trend::Up`] when the mean of
//! the recent half exceeds the mean of the older half by more than the
//! epsilon, [`Trend::Down`] when it is lower by more than the epsilon, and
//! [`Trend::Stable`] otherwise (including every window shorter than two).

use weather_insights_reading_models::Reading;
use weather_insights_stats_models::{StatisticsSnapshot, Trend, WindowOrder};

/// Default minimum difference in °C between half-window means before a
/// trend is reported.
pub const TREND_EPSILON_CELSIUS: f64 = 0.1;

/// Computes a [`StatisticsSnapshot`] using [`TREND_EPSILON_CELSIUS`].
#[must_use]
pub fn compute_statistics(
    location_id: &str,
    window: &[Reading],
    order: WindowOrder,
) -> StatisticsSnapshot {
    compute_statistics_with_epsilon(location_id, window, order, TREND_EPSILON_CELSIUS)
}

/// Computes a [`StatisticsSnapshot`] with an explicit trend epsilon.
///
/// `order` states how `window` is sorted. `current` is always the reading
/// with the latest timestamp, whatever the order.
#[must_use]
pub fn compute_statistics_with_epsilon(
    location_id: &str,
    window: &[Reading],
    order: WindowOrder,
    epsilon: f64,
) -> StatisticsSnapshot {
    if window.is_empty() {
        return StatisticsSnapshot::empty(location_id.to_string());
    }

    let chronological: Vec<f64> = match order {
        WindowOrder::OldestFirst => window.iter().map(|r| r.temperature).collect(),
        WindowOrder::NewestFirst => window.iter().rev().map(|r| r.temperature).collect(),
    };

    let min = chronological.iter().copied().fold(f64::INFINITY, f64::min);
    let max = chronological.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Rounding can push the mean of near-identical values just outside the
    // extrema.
    let avg = mean(&chronological).clamp(min, max);

    let trend = classify_trend(&chronological, epsilon);
    let current = window.iter().max_by_key(|r| r.timestamp).cloned();

    log::trace!(
        "compute_statistics: location={location_id} n={} avg={avg:.2} trend={trend}",
        window.len()
    );

    StatisticsSnapshot {
        location_id: location_id.to_string(),
        current,
        avg_temperature: Some(avg),
        max_temperature: Some(max),
        min_temperature: Some(min),
        trend,
        sample_count: window.len(),
    }
}

/// Classifies chronologically ordered temperatures into a [`Trend`].
#[must_use]
pub fn classify_trend(chronological: &[f64], epsilon: f64) -> Trend {
    if chronological.len() < 2 {
        return Trend::Stable;
    }

    let half = chronological.len() / 2;
    let older = &chronological[..half];
    let recent = &chronological[chronological.len() - half..];

    let delta = mean(recent) - mean(older);

    if delta > epsilon {
        Trend::Up
    } else if delta < -epsilon {
        Trend::Down
    } else {
        Trend::Stable
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone as _, Utc};

    use super::*;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
    }

    /// Builds readings one hour apart, oldest first.
    fn window(temps: &[f64]) -> Vec<Reading> {
        temps
            .iter()
            .enumerate()
            .map(|(i, &temperature)| Reading {
                id: format!("r-{i}"),
                location_id: "Curitiba".to_string(),
                country: None,
                timestamp: base_time() + Duration::hours(i64::try_from(i).unwrap()),
                temperature,
                feels_like: temperature,
                humidity_pct: 55.0,
                pressure: 1013.0,
                wind_speed: 2.0,
                wind_direction: 90.0,
                condition_code: "Clear".to_string(),
                condition_text: "clear sky".to_string(),
                cloudiness_pct: 0.0,
                visibility: 10_000.0,
                sunrise: None,
                sunset: None,
            })
            .collect()
    }

    fn newest_first(temps: &[f64]) -> Vec<Reading> {
        let mut readings = window(temps);
        readings.reverse();
        readings
    }

    #[test]
    fn empty_window_has_no_data() {
        let snapshot = compute_statistics("Curitiba", &[], WindowOrder::NewestFirst);

        assert!(!snapshot.has_data());
        assert!(snapshot.current.is_none());
        assert!(snapshot.avg_temperature.is_none());
        assert_eq!(snapshot.trend, Trend::Stable);
        assert_eq!(snapshot.location_id, "Curitiba");
    }

    #[test]
    fn single_reading_is_stable() {
        let snapshot = compute_statistics("Curitiba", &window(&[40.0]), WindowOrder::OldestFirst);

        assert_eq!(snapshot.trend, Trend::Stable);
        assert_eq!(snapshot.avg_temperature, Some(40.0));
        assert_eq!(snapshot.current.unwrap().id, "r-0");
    }

    #[test]
    fn aggregates_and_current() {
        let snapshot = compute_statistics(
            "Curitiba",
            &newest_first(&[10.0, 20.0, 15.0, 25.0]),
            WindowOrder::NewestFirst,
        );

        assert_eq!(snapshot.sample_count, 4);
        assert_eq!(snapshot.min_temperature, Some(10.0));
        assert_eq!(snapshot.max_temperature, Some(25.0));
        assert_eq!(snapshot.avg_temperature, Some(17.5));
        assert_eq!(snapshot.current.unwrap().id, "r-3");
    }

    #[test]
    fn increasing_window_trends_up() {
        let temps = [18.0, 19.0, 20.5, 22.0, 23.0];
        assert_eq!(
            compute_statistics("Curitiba", &window(&temps), WindowOrder::OldestFirst).trend,
            Trend::Up
        );
        assert_eq!(
            compute_statistics("Curitiba", &newest_first(&temps), WindowOrder::NewestFirst).trend,
            Trend::Up
        );
    }

    #[test]
    fn decreasing_window_trends_down() {
        let temps = [30.0, 28.0, 27.5, 24.0];
        assert_eq!(
            compute_statistics("Curitiba", &window(&temps), WindowOrder::OldestFirst).trend,
            Trend::Down
        );
        assert_eq!(
            compute_statistics("Curitiba", &newest_first(&temps), WindowOrder::NewestFirst).trend,
            Trend::Down
        );
    }

    #[test]
    fn constant_window_is_stable() {
        let snapshot = compute_statistics(
            "Curitiba",
            &window(&[21.0, 21.0, 21.0, 21.0]),
            WindowOrder::OldestFirst,
        );
        assert_eq!(snapshot.trend, Trend::Stable);
    }

    #[test]
    fn differences_within_epsilon_are_stable() {
        assert_eq!(classify_trend(&[20.0, 20.05], 0.1), Trend::Stable);
        assert_eq!(classify_trend(&[20.0, 19.95], 0.1), Trend::Stable);
        assert_eq!(classify_trend(&[20.0, 20.2], 0.1), Trend::Up);
        assert_eq!(classify_trend(&[20.0, 19.8], 0.1), Trend::Down);
    }

    #[test]
    fn odd_middle_reading_is_ignored() {
        // Halves are [10] and [10]; the spike in the middle belongs to neither.
        assert_eq!(classify_trend(&[10.0, 35.0, 10.0], 0.1), Trend::Stable);
        // Halves are [10, 11] and [12, 13].
        assert_eq!(classify_trend(&[10.0, 11.0, 0.0, 12.0, 13.0], 0.1), Trend::Up);
    }

    #[test]
    fn fewer_than_two_is_stable_for_any_epsilon() {
        assert_eq!(classify_trend(&[], 0.0), Trend::Stable);
        assert_eq!(classify_trend(&[99.0], 0.0), Trend::Stable);
    }

    #[test]
    fn custom_epsilon_suppresses_small_moves() {
        let readings = window(&[20.0, 20.0, 21.0, 21.0]);
        assert_eq!(
            compute_statistics_with_epsilon("Curitiba", &readings, WindowOrder::OldestFirst, 2.0)
                .trend,
            Trend::Stable
        );
        assert_eq!(
            compute_statistics_with_epsilon("Curitiba", &readings, WindowOrder::OldestFirst, 0.5)
                .trend,
            Trend::Up
        );
    }

    #[test]
    fn mean_stays_between_extrema() {
        let windows: [&[f64]; 4] = [
            &[0.1, 0.1, 0.1],
            &[-5.3, 12.7, 0.0, 3.3],
            &[1e-9, 1e-9 + 1e-12],
            &[33.3; 7],
        ];

        for temps in windows {
            let snapshot = compute_statistics("Curitiba", &window(temps), WindowOrder::OldestFirst);
            let (min, avg, max) = (
                snapshot.min_temperature.unwrap(),
                snapshot.avg_temperature.unwrap(),
                snapshot.max_temperature.unwrap(),
            );
            assert!(min <= avg && avg <= max, "{min} <= {avg} <= {max} for {temps:?}");
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let readings = newest_first(&[12.0, 14.0, 13.0]);
        let a = compute_statistics("Curitiba", &readings, WindowOrder::NewestFirst);
        let b = compute_statistics("Curitiba", &readings, WindowOrder::NewestFirst);
        assert_eq!(a, b);
    }
}
