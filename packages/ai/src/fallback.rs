//! Deterministic rule-based insights.
//!
//! Used whenever the primary generator is unavailable. The text depends on
//! the reading alone, never on history:
//!
//! 1. Exactly one base message, by temperature: above
//!    [`HEAT_THRESHOLD_CELSIUS`] a heat advisory, below
//!    [`COLD_THRESHOLD_CELSIUS`] a cold advisory, otherwise a pleasant
//!    conditions message.
//! 2. A humidity note when humidity is above [`HUMIDITY_THRESHOLD_PCT`].
//! 3. A rain note when the condition mentions rain.
//!
//! Notes are appended in that order, separated by a space.

use weather_insights_reading_models::Reading;

use crate::InsightLanguage;

/// Temperatures strictly above this get the heat advisory.
pub const HEAT_THRESHOLD_CELSIUS: f64 = 30.0;

/// Temperatures strictly below this get the cold advisory.
pub const COLD_THRESHOLD_CELSIUS: f64 = 15.0;

/// Humidity strictly above this gets the discomfort note.
pub const HUMIDITY_THRESHOLD_PCT: f64 = 80.0;

/// Message table for one language.
#[derive(Debug, Clone, Copy)]
pub struct FallbackMessages {
    /// Heat advisory base message.
    pub heat: &'static str,
    /// Cold advisory base message.
    pub cold: &'static str,
    /// Neutral base message.
    pub pleasant: &'static str,
    /// High-humidity supplement.
    pub humidity: &'static str,
    /// Rain supplement.
    pub rain: &'static str,
}

const ENGLISH: FallbackMessages = FallbackMessages {
    heat: "🌡️ High temperature. Stay hydrated and wear light clothing.",
    cold: "🧥 Low temperature. Wear warm clothing and protect yourself from the cold.",
    pleasant: "😊 Pleasant weather. Great for outdoor activities.",
    humidity: "💧 High humidity. May cause thermal discomfort.",
    rain: "☔ Rain expected. Bring an umbrella and avoid flooded areas.",
};

const PORTUGUESE: FallbackMessages = FallbackMessages {
    heat: "🌡️ Temperatura elevada. Recomenda-se hidratação constante e roupas leves.",
    cold: "🧥 Temperatura baixa. Ideal usar agasalhos e se proteger do frio.",
    pleasant: "😊 Clima agradável. Ótimo para atividades ao ar livre.",
    humidity: "💧 Alta umidade. Pode causar desconforto térmico.",
    rain: "☔ Chuva prevista. Leve guarda-chuva e evite áreas alagadas.",
};

/// Message table for `language`.
#[must_use]
pub const fn messages(language: InsightLanguage) -> &'static FallbackMessages {
    match language {
        InsightLanguage::English => &ENGLISH,
        InsightLanguage::Portuguese => &PORTUGUESE,
    }
}

/// Derives the rule-based insight text for `reading`.
#[must_use]
pub fn fallback_insight(reading: &Reading, language: InsightLanguage) -> String {
    let messages = messages(language);

    let base = if reading.temperature > HEAT_THRESHOLD_CELSIUS {
        messages.heat
    } else if reading.temperature < COLD_THRESHOLD_CELSIUS {
        messages.cold
    } else {
        messages.pleasant
    };

    let mut text = base.to_string();

    if reading.humidity_pct > HUMIDITY_THRESHOLD_PCT {
        text.push(' ');
        text.push_str(messages.humidity);
    }

    if reading.indicates_rain() {
        text.push(' ');
        text.push_str(messages.rain);
    }

    text
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn reading(temperature: f64, humidity_pct: f64, condition: &str) -> Reading {
        Reading {
            id: "r-1".to_string(),
            location_id: "Manaus".to_string(),
            country: None,
            timestamp: Utc::now(),
            temperature,
            feels_like: temperature,
            humidity_pct,
            pressure: 1008.0,
            wind_speed: 1.0,
            wind_direction: 0.0,
            condition_code: condition.to_string(),
            condition_text: condition.to_string(),
            cloudiness_pct: 0.0,
            visibility: 10_000.0,
            sunrise: None,
            sunset: None,
        }
    }

    #[test]
    fn hot_humid_rainy_gets_everything_in_order() {
        let text = fallback_insight(&reading(32.0, 85.0, "light rain"), InsightLanguage::English);

        assert_eq!(
            text,
            format!("{} {} {}", ENGLISH.heat, ENGLISH.humidity, ENGLISH.rain)
        );
        let heat = text.find(ENGLISH.heat).unwrap();
        let humidity = text.find(ENGLISH.humidity).unwrap();
        let rain = text.find(ENGLISH.rain).unwrap();
        assert!(heat < humidity && humidity < rain);
    }

    #[test]
    fn cold_and_dry_gets_only_cold_advisory() {
        let text = fallback_insight(&reading(10.0, 40.0, "clear"), InsightLanguage::English);
        assert_eq!(text, ENGLISH.cold);
    }

    #[test]
    fn mild_clear_gets_neutral_message() {
        let text = fallback_insight(&reading(22.0, 50.0, "clear"), InsightLanguage::English);
        assert_eq!(text, ENGLISH.pleasant);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(
            fallback_insight(&reading(30.0, 80.0, "Clear"), InsightLanguage::English),
            ENGLISH.pleasant
        );
        assert_eq!(
            fallback_insight(&reading(15.0, 50.0, "Clear"), InsightLanguage::English),
            ENGLISH.pleasant
        );
        assert_eq!(
            fallback_insight(&reading(14.9, 80.1, "Clear"), InsightLanguage::English),
            format!("{} {}", ENGLISH.cold, ENGLISH.humidity)
        );
    }

    #[test]
    fn rain_without_humidity() {
        assert_eq!(
            fallback_insight(&reading(20.0, 60.0, "RAIN"), InsightLanguage::English),
            format!("{} {}", ENGLISH.pleasant, ENGLISH.rain)
        );
    }

    #[test]
    fn portuguese_table_follows_same_rules() {
        let text = fallback_insight(&reading(32.0, 85.0, "Rain"), InsightLanguage::Portuguese);
        assert_eq!(
            text,
            format!("{} {} {}", PORTUGUESE.heat, PORTUGUESE.humidity, PORTUGUESE.rain)
        );
    }

    #[test]
    fn same_reading_same_text() {
        let r = reading(27.0, 90.0, "drizzle");
        assert_eq!(
            fallback_insight(&r, InsightLanguage::English),
            fallback_insight(&r, InsightLanguage::English)
        );
    }
}
