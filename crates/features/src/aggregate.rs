//! Per-inspection aggregation of violation signals

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::records::InspectionKey;

/// Text signals of one violation row
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationSignal {
    pub key: InspectionKey,
    pub score: f64,
    pub keywords: Vec<String>,
}

/// All violations of one inspection folded together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectionSummary {
    pub n_violations: usize,
    pub violation_score: f64,
    /// Flattened keyword hits; a keyword repeats once per violation naming it
    pub keywords: Vec<String>,
}

/// Summaries keyed by (venue, inspection date)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViolationSummaries {
    by_key: BTreeMap<InspectionKey, InspectionSummary>,
}

impl ViolationSummaries {
    /// Group signals by inspection, summing scores in row order and
    /// concatenating keyword hits.
    pub fn aggregate<I>(signals: I) -> Self
    where
        I: IntoIterator<Item = ViolationSignal>,
    {
        let mut by_key: BTreeMap<InspectionKey, InspectionSummary> = BTreeMap::new();
        let mut rows = 0usize;
        for signal in signals {
            let summary = by_key.entry(signal.key).or_default();
            summary.n_violations += 1;
            summary.violation_score += signal.score;
            summary.keywords.extend(signal.keywords);
            rows += 1;
        }
        debug!(rows, inspections = by_key.len(), "aggregated violation signals");
        Self { by_key }
    }

    pub fn get(&self, key: &InspectionKey) -> Option<&InspectionSummary> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InspectionKey, &InspectionSummary)> {
        self.by_key.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key(camis: u64, day: u32) -> InspectionKey {
        InspectionKey {
            camis,
            date: NaiveDate::from_ymd_opt(2017, 3, day).unwrap(),
        }
    }

    fn signal(camis: u64, day: u32, score: f64, keywords: &[&str]) -> ViolationSignal {
        ViolationSignal {
            key: key(camis, day),
            score,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    #[test]
    fn test_groups_by_venue_and_date() {
        let summaries = ViolationSummaries::aggregate(vec![
            signal(1, 5, 0.5, &["mice"]),
            signal(1, 5, 0.25, &["mice", "rats"]),
            signal(1, 6, -0.125, &[]),
            signal(2, 5, 1.0, &["flies"]),
        ]);

        assert_eq!(summaries.len(), 3);

        let first = summaries.get(&key(1, 5)).unwrap();
        assert_eq!(first.n_violations, 2);
        assert_eq!(first.violation_score, 0.75);
        assert_eq!(first.keywords, vec!["mice", "mice", "rats"]);

        let second = summaries.get(&key(1, 6)).unwrap();
        assert_eq!(second.n_violations, 1);
        assert!(second.keywords.is_empty());

        assert!(summaries.get(&key(3, 5)).is_none());
    }

    #[test]
    fn test_empty_input() {
        let summaries = ViolationSummaries::aggregate(Vec::new());
        assert!(summaries.is_empty());
    }
}
