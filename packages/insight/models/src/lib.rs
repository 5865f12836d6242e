#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Insight record types.
//!
//! An [`Insight`] is the persisted textual interpretation of one reading,
//! tagged with the [`InsightOrigin`] that produced it so downstream
//! consumers can tell a model-written analysis from the rule-based one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which generator produced an insight.
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
pub enum InsightOrigin {
    /// Written by the external text-generation service.
    Primary,
    /// Derived locally from the reading by the deterministic rules.
    Fallback,
}

/// An insight that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInsight {
    /// Location the source reading belongs to.
    pub location_id: String,
    /// Insight body.
    pub text: String,
    /// Id of the reading this insight describes.
    pub source_reading_id: String,
    /// When the text was produced.
    pub generated_at: DateTime<Utc>,
    /// Which generator produced the text.
    pub origin: InsightOrigin,
}

impl NewInsight {
    /// Attaches a store-assigned id.
    #[must_use]
    pub fn with_id(self, id: String) -> Insight {
        Insight {
            id,
            location_id: self.location_id,
            text: self.text,
            source_reading_id: self.source_reading_id,
            generated_at: self.generated_at,
            origin: self.origin,
        }
    }
}

/// A persisted, immutable insight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Store-assigned identifier.
    pub id: String,
    /// Location the source reading belongs to.
    pub location_id: String,
    /// Insight body.
    pub text: String,
    /// Id of the reading this insight describes.
    pub source_reading_id: String,
    /// When the text was produced.
    pub generated_at: DateTime<Utc>,
    /// Which generator produced the text.
    pub origin: InsightOrigin,
}
