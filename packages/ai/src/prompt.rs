//! Prompt construction for the primary generator.
//!
//! History lines are rendered newest first and capped, so a long window
//! cannot blow up the prompt.

use weather_insights_reading_models::Reading;

use crate::InsightLanguage;

/// Fixed system instruction constraining the shape of the analysis.
#[must_use]
pub fn build_system_prompt(language: InsightLanguage) -> String {
    format!(
        "You are a meteorological expert. Provide concise, accurate weather insights in {language}.\n\
         Structure every answer as:\n\
         1. Current conditions: a one or two sentence summary.\n\
         2. Trends: what the recent history shows.\n\
         3. Recommendations: practical advice (clothing, activities, etc.).\n\
         4. Alerts: only if something warrants one; otherwise omit this section.\n\
         Answer only in {language}. Be brief.",
        language = language.display_name(),
    )
}

/// Builds the user prompt for `current` with up to `history_limit` entries
/// of `history`, newest first.
#[must_use]
pub fn build_insight_prompt(current: &Reading, history: &[Reading], history_limit: usize) -> String {
    let mut entries: Vec<&Reading> = history.iter().collect();
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(history_limit);

    let history_lines = if entries.is_empty() {
        "- (no earlier readings)".to_string()
    } else {
        entries
            .iter()
            .map(|r| {
                format!(
                    "- {}: {:.1}°C, {:.0}% humidity, {}",
                    r.timestamp.format("%Y-%m-%d %H:%M UTC"),
                    r.temperature,
                    r.humidity_pct,
                    r.condition_code,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r"Analyze the current and historical weather data and provide useful insights.

CURRENT DATA:
- Location: {location}
- Temperature: {temperature:.1}°C
- Feels like: {feels_like:.1}°C
- Humidity: {humidity:.0}%
- Wind speed: {wind_speed:.1} m/s
- Condition: {condition}
- Description: {description}

HISTORICAL DATA (newest first, {count} entries):
{history_lines}

Provide:
1. Analysis of the current conditions
2. Observed trends
3. Recommendations (clothing, activities, etc.)
4. Alerts if necessary",
        location = current.location_id,
        temperature = current.temperature,
        feels_like = current.feels_like,
        humidity = current.humidity_pct,
        wind_speed = current.wind_speed,
        condition = current.condition_code,
        description = current.condition_text,
        count = entries.len(),
    )
}
