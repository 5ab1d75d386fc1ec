//! Categorical encoders
//!
//! Borough, inspection type and month are fixed transforms. Cuisine hit rates
//! are fitted on training labels and only looked up afterwards.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{FeatureError, Result};

/// Borough → ordinal index. Ordered by observed pass rate, not alphabetically.
const BOROUGH_TABLE: &[(&str, u8)] = &[
    ("MISSING", 0),
    ("STATEN ISLAND", 1),
    ("BROOKLYN", 2),
    ("MANHATTAN", 3),
    ("BRONX", 4),
    ("QUEENS", 5),
];

/// Fixed borough lookup; unknown values are an error, never a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoroughEncoder {
    table: BTreeMap<String, u8>,
}

impl Default for BoroughEncoder {
    fn default() -> Self {
        Self {
            table: BOROUGH_TABLE
                .iter()
                .map(|&(name, idx)| (name.to_string(), idx))
                .collect(),
        }
    }
}

impl BoroughEncoder {
    /// Index of a borough name, ignoring ASCII case and surrounding blanks.
    pub fn encode(&self, boro: &str) -> Result<u8> {
        let normalized = boro.trim().to_ascii_uppercase();
        self.table
            .get(&normalized)
            .copied()
            .ok_or_else(|| FeatureError::UnknownBorough(boro.to_string()))
    }
}

/// `re_inspect`: inspection type mentions a re-inspection
pub fn is_reinspection(inspection_type: &str) -> bool {
    inspection_type.to_lowercase().contains("re-")
}

/// `initial_inspect`: inspection type mentions an initial inspection
pub fn is_initial_inspection(inspection_type: &str) -> bool {
    inspection_type.to_lowercase().contains("initial")
}

/// Re-centre a calendar month so July is 1 and June is 0.
pub fn shift_month(month: u32) -> u32 {
    (month + 6) % 12
}

/// `inspection_month` feature of a date
pub fn encode_month(date: NaiveDate) -> u32 {
    shift_month(date.month())
}

/// Mean training pass rate per cuisine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CuisineHitRates {
    rates: BTreeMap<String, f64>,
}

impl CuisineHitRates {
    /// Fit from `(cuisine, passed)` pairs; rows without a cuisine are skipped.
    pub fn fit<'a, I>(observations: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'a str>, bool)>,
    {
        let mut tallies: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
        for (cuisine, passed) in observations {
            let Some(cuisine) = cuisine else { continue };
            let tally = tallies.entry(cuisine).or_insert((0, 0));
            tally.0 += u64::from(passed);
            tally.1 += 1;
        }
        let rates = tallies
            .into_iter()
            .map(|(cuisine, (passes, total))| (cuisine.to_string(), passes as f64 / total as f64))
            .collect();
        Self { rates }
    }

    /// Hit rate of a cuisine; `NaN` for cuisines unseen in training.
    pub fn rate(&self, cuisine: Option<&str>) -> f64 {
        cuisine
            .and_then(|c| self.rates.get(c))
            .copied()
            .unwrap_or(f64::NAN)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Multi-label binarization against a fixed vocabulary.
///
/// One 0/1 value per vocabulary word, in vocabulary order. Repeated hits
/// collapse to 1 and hits outside the vocabulary are ignored.
pub fn one_hot(vocabulary: &[String], hits: &[String]) -> Vec<f64> {
    vocabulary
        .iter()
        .map(|word| if hits.contains(word) { 1.0 } else { 0.0 })
        .collect()
}
