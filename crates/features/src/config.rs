//! Feature pipeline configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::errors::{FeatureError, Result};
use crate::table::BASE_FEATURES;
use crate::text::DEFAULT_EXTREME_KEYWORDS;

/// Feature configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Extreme keywords; each becomes one indicator column, in this order
    pub extreme_keywords: Vec<String>,
    /// Numeric venue metadata columns appended as features
    pub venue_columns: Vec<String>,
    /// How many top differential words to log after fitting
    pub log_top_words: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            extreme_keywords: DEFAULT_EXTREME_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            venue_columns: Vec::new(),
            log_top_words: 10,
        }
    }
}

impl FeatureConfig {
    /// Reject configurations that would produce an ambiguous or dead schema.
    pub fn validate(&self) -> Result<()> {
        let mut names: BTreeSet<&str> = BASE_FEATURES.iter().copied().collect();

        for keyword in &self.extreme_keywords {
            if keyword.is_empty() {
                return Err(FeatureError::InvalidConfig(
                    "extreme keyword must not be empty".into(),
                ));
            }
            // Descriptions are lowercased before matching.
            if keyword.to_lowercase() != *keyword {
                return Err(FeatureError::InvalidConfig(format!(
                    "extreme keyword '{keyword}' must be lowercase"
                )));
            }
            if !names.insert(keyword) {
                return Err(FeatureError::InvalidConfig(format!(
                    "duplicate feature column '{keyword}'"
                )));
            }
        }

        for column in &self.venue_columns {
            if column.trim().is_empty() || column == "camis" {
                return Err(FeatureError::InvalidConfig(format!(
                    "invalid venue column '{column}'"
                )));
            }
            if !names.insert(column) {
                return Err(FeatureError::InvalidConfig(format!(
                    "duplicate feature column '{column}'"
                )));
            }
        }

        Ok(())
    }
}
