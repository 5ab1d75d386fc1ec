//! Feature engineering for inspection pass prediction
//!
//! Turns inspection, venue and violation tables into a fixed-width numeric
//! feature matrix. Statistics that depend on outcome labels are fitted on the
//! training inspections only and reused unchanged for every other set.
//!
//! Modules:
//! - `records`: raw inspection, venue and violation rows
//! - `text`: tokenizer, differential word frequencies, scorer, keywords
//! - `aggregate`: per-inspection violation summaries
//! - `encoders`: borough, inspection type, month and cuisine encoders
//! - `join`: keyed lookups and join cardinality checks
//! - `fitted`: the training-fitted encoder bundle
//! - `table`: feature schema, matrix and builder
//! - `classifier`: contract for the downstream learner

pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod encoders;
pub mod errors;
pub mod fitted;
pub mod join;
pub mod records;
pub mod table;
pub mod text;

pub use aggregate::{InspectionSummary, ViolationSignal, ViolationSummaries};
pub use classifier::{Classifier, PriorClassifier};
pub use config::FeatureConfig;
pub use encoders::{BoroughEncoder, CuisineHitRates};
pub use errors::{FeatureError, Result};
pub use fitted::{FittedEncoders, FittedSummary};
pub use join::VenueIndex;
pub use records::{InspectionKey, InspectionRecord, VenueId, VenueRecord, ViolationRecord};
pub use table::{FeatureMatrix, FeatureSchema, FeatureTableBuilder, BASE_FEATURES};

/// Crate version string for run reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Feature matrices for a training set and any number of evaluation sets
#[derive(Debug, Clone)]
pub struct PreparedFeatures {
    pub encoders: FittedEncoders,
    pub summary: FittedSummary,
    pub training: FeatureMatrix,
    pub evaluation: Vec<FeatureMatrix>,
}

/// Fit encoders on `training` and transform it together with every
/// evaluation set.
///
/// Violation summaries are computed once with the fitted scorer and shared by
/// all sets. Every evaluation matrix is checked against the training schema.
pub fn prepare_features(
    training: &[InspectionRecord],
    evaluation: &[&[InspectionRecord]],
    violations: &[ViolationRecord],
    venues: &VenueIndex,
    config: &FeatureConfig,
) -> Result<PreparedFeatures> {
    let (encoders, summary) = FittedEncoders::fit(training, violations, venues, config)?;
    let summaries = encoders.summarize(violations);

    let training_matrix = encoders.transform(training, &summaries, venues)?;
    let mut evaluation_matrices = Vec::with_capacity(evaluation.len());
    for set in evaluation {
        let matrix = encoders.transform(set, &summaries, venues)?;
        matrix.ensure_schema(training_matrix.schema())?;
        evaluation_matrices.push(matrix);
    }

    Ok(PreparedFeatures {
        encoders,
        summary,
        training: training_matrix,
        evaluation: evaluation_matrices,
    })
}
