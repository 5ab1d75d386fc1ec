//! Encoders fitted once on training data
//!
//! [`FittedEncoders`] bundles every statistic learned from training labels:
//! the differential word table, cuisine hit rates, the keyword vocabulary and
//! the resulting schema. Evaluation data is only ever transformed with it;
//! nothing is refitted on validation or test inspections.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

use crate::aggregate::{ViolationSignal, ViolationSummaries};
use crate::config::FeatureConfig;
use crate::encoders::{BoroughEncoder, CuisineHitRates};
use crate::errors::Result;
use crate::join::{resolve_cuisine, VenueIndex};
use crate::records::{InspectionKey, InspectionRecord, ViolationRecord};
use crate::table::{FeatureMatrix, FeatureSchema, FeatureTableBuilder};
use crate::text::{
    normalize_description, DifferentialTable, KeywordExtractor, TextScorer, WordFrequencies,
};

#[derive(Debug, Clone)]
pub struct FittedEncoders {
    boroughs: BoroughEncoder,
    cuisine: CuisineHitRates,
    scorer: TextScorer,
    keywords: KeywordExtractor,
    venue_columns: Vec<String>,
    schema: FeatureSchema,
}

/// Serializable overview of what was fitted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedSummary {
    pub training_inspections: usize,
    pub labelled_violations: usize,
    pub failed_tokens: u64,
    pub passed_tokens: u64,
    pub differential_words: usize,
    pub cuisines: usize,
    pub columns: Vec<String>,
}

impl FittedEncoders {
    /// Fit on labelled training inspections.
    ///
    /// A violation joins the training inspection(s) with the same venue and
    /// date; violations of inspections outside the training set are ignored.
    #[instrument(skip_all, fields(training = training.len(), violations = violations.len()))]
    pub fn fit(
        training: &[InspectionRecord],
        violations: &[ViolationRecord],
        venues: &VenueIndex,
        config: &FeatureConfig,
    ) -> Result<(Self, FittedSummary)> {
        config.validate()?;

        let outcomes = training
            .iter()
            .map(InspectionRecord::label)
            .collect::<Result<Vec<bool>>>()?;

        let mut labels: BTreeMap<InspectionKey, Vec<bool>> = BTreeMap::new();
        for (record, &passed) in training.iter().zip(&outcomes) {
            labels.entry(record.key()).or_default().push(passed);
        }

        let mut failed_text = Vec::new();
        let mut passed_text = Vec::new();
        for violation in violations {
            let Some(class_labels) = labels.get(&violation.key()) else {
                continue;
            };
            for &passed in class_labels {
                if passed {
                    passed_text.push(violation.description());
                } else {
                    failed_text.push(violation.description());
                }
            }
        }

        let failed = WordFrequencies::from_descriptions(failed_text.iter().copied());
        let passed = WordFrequencies::from_descriptions(passed_text.iter().copied());
        let table = DifferentialTable::fit(&failed, &passed);

        let n = config.log_top_words;
        debug!(top = ?failed.most_common(n), "most common words in failed inspections");
        debug!(top = ?passed.most_common(n), "most common words in passed inspections");
        debug!(top = ?table.most_failing(n), "words most indicative of failing");
        debug!(top = ?table.most_passing(n), "words most indicative of passing");

        let cuisine = CuisineHitRates::fit(
            training
                .iter()
                .zip(outcomes.iter().copied())
                .map(|(r, passed)| (resolve_cuisine(r, venues.get(r.camis)), passed)),
        );

        let keywords = KeywordExtractor::new(config.extreme_keywords.iter().cloned())?;
        let schema = FeatureSchema::new(&config.venue_columns, keywords.keywords());

        let summary = FittedSummary {
            training_inspections: training.len(),
            labelled_violations: failed_text.len() + passed_text.len(),
            failed_tokens: failed.total(),
            passed_tokens: passed.total(),
            differential_words: table.len(),
            cuisines: cuisine.len(),
            columns: schema.columns().to_vec(),
        };

        info!(
            differential_words = summary.differential_words,
            cuisines = summary.cuisines,
            columns = schema.len(),
            "Fitted encoders on training data"
        );

        let encoders = Self {
            boroughs: BoroughEncoder::default(),
            cuisine,
            scorer: TextScorer::new(table)?,
            keywords,
            venue_columns: config.venue_columns.clone(),
            schema,
        };
        Ok((encoders, summary))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn boroughs(&self) -> &BoroughEncoder {
        &self.boroughs
    }

    pub fn cuisine_rates(&self) -> &CuisineHitRates {
        &self.cuisine
    }

    pub fn scorer(&self) -> &TextScorer {
        &self.scorer
    }

    pub fn differential_table(&self) -> &DifferentialTable {
        self.scorer.table()
    }

    pub fn keywords(&self) -> &KeywordExtractor {
        &self.keywords
    }

    pub fn venue_columns(&self) -> &[String] {
        &self.venue_columns
    }

    /// Score and keyword hits of every violation row.
    pub fn violation_signals(&self, violations: &[ViolationRecord]) -> Vec<ViolationSignal> {
        violations
            .iter()
            .map(|v| {
                let text = normalize_description(v.description());
                ViolationSignal {
                    key: v.key(),
                    score: self.scorer.score(&text),
                    keywords: self.keywords.extract(&text),
                }
            })
            .collect()
    }

    /// Per-inspection violation summaries under the fitted scorer.
    pub fn summarize(&self, violations: &[ViolationRecord]) -> ViolationSummaries {
        ViolationSummaries::aggregate(self.violation_signals(violations))
    }

    /// Build the feature matrix of any inspection set.
    pub fn transform(
        &self,
        inspections: &[InspectionRecord],
        summaries: &ViolationSummaries,
        venues: &VenueIndex,
    ) -> Result<FeatureMatrix> {
        FeatureTableBuilder::new(self, summaries, venues).build(inspections)
    }
}
