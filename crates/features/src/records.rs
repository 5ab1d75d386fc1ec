//! Raw record types for inspections, venues and violations
//!
//! Records are read once from static CSV sources and never mutated; derived
//! values live in the feature table instead.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::errors::{FeatureError, Result};

/// Venue identifier (`camis`)
pub type VenueId = u64;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Parse an inspection date, accepting plain dates and timestamps.
pub fn parse_inspection_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts.date());
        }
    }
    Err(FeatureError::InvalidDate(raw.to_string()))
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_inspection_date(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_label<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some("1") | Some("1.0") => Ok(Some(true)),
        Some("0") | Some("0.0") => Ok(Some(false)),
        Some(other) if other.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(other) if other.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid passed label '{other}'"
        ))),
    }
}

/// Join key shared by inspections and their violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InspectionKey {
    pub camis: VenueId,
    pub date: NaiveDate,
}

impl std::fmt::Display for InspectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.camis, self.date)
    }
}

/// A single inspection event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    /// Unique row id, echoed back in the submission
    pub id: String,

    pub camis: VenueId,

    #[serde(deserialize_with = "deserialize_date")]
    pub inspection_date: NaiveDate,

    #[serde(default)]
    pub inspection_type: String,

    /// Outcome label, present only in training data
    #[serde(default, deserialize_with = "deserialize_label")]
    pub passed: Option<bool>,

    /// Borough; filled from venue metadata when absent
    #[serde(default)]
    pub boro: Option<String>,

    /// Cuisine category; filled from venue metadata when absent
    #[serde(default)]
    pub cuisine_description: Option<String>,
}

impl InspectionRecord {
    pub fn key(&self) -> InspectionKey {
        InspectionKey {
            camis: self.camis,
            date: self.inspection_date,
        }
    }

    /// Training label, or an error naming the offending row.
    pub fn label(&self) -> Result<bool> {
        self.passed.ok_or_else(|| FeatureError::MissingLabel {
            id: self.id.clone(),
        })
    }
}

/// One violation noted during an inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub camis: VenueId,

    #[serde(deserialize_with = "deserialize_date")]
    pub inspection_date: NaiveDate,

    #[serde(default)]
    pub violation_description: Option<String>,
}

impl ViolationRecord {
    pub fn key(&self) -> InspectionKey {
        InspectionKey {
            camis: self.camis,
            date: self.inspection_date,
        }
    }

    /// Description text; missing descriptions read as empty.
    pub fn description(&self) -> &str {
        self.violation_description.as_deref().unwrap_or("")
    }
}

/// Static per-venue attributes keyed by `camis`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VenueRecord {
    pub camis: VenueId,
    pub attributes: BTreeMap<String, String>,
}

impl VenueRecord {
    /// Non-empty attribute value by column name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Attribute parsed as a number; `NaN` when absent or not numeric
    pub fn numeric_attribute(&self, name: &str) -> f64 {
        self.attribute(name)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(f64::NAN)
    }
}
