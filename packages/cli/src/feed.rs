//! JSON-lines reading feeds.
//!
//! One collector payload per line. Blank lines and lines starting with `#`
//! are skipped.

use std::path::{Path, PathBuf};

use thiserror::Error;
use weather_insights_reading_models::NewReading;

/// Errors reading a feed file.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Feed file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A line is not a valid reading payload.
    #[error("Line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Underlying error.
        source: serde_json::Error,
    },
}

/// Reads and parses every reading in `path`.
///
/// # Errors
///
/// Returns [`FeedError`] if the file cannot be read or a line fails to
/// parse.
pub async fn load(path: &Path) -> Result<Vec<NewReading>, FeedError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let readings = parse(&text)?;
    log::info!("Loaded {} readings from {}", readings.len(), path.display());
    Ok(readings)
}

/// Parses a JSON-lines feed.
///
/// # Errors
///
/// Returns [`FeedError::Parse`] naming the first bad line.
pub fn parse(text: &str) -> Result<Vec<NewReading>, FeedError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| FeedError::Parse { line: i + 1, source })
        })
        .collect()
}
