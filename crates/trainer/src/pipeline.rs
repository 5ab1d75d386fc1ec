//! End-to-end run: load, split, build features, train, evaluate, submit
//!
//! Encoders are fitted on the training side of the holdout split only; the
//! validation and test inspections are transformed with them unchanged.

use inspecta_features::{
    prepare_features, Classifier, FeatureMatrix, FittedSummary, InspectionRecord,
    PriorClassifier,
};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::config::TrainerConfig;
use crate::dataset::RawTables;
use crate::deterministic::train_validation_split;
use crate::errors::{Result, TrainerError};
use crate::gbdt::GbdtModel;
use crate::metrics::ValidationMetrics;
use crate::submission::write_submission_file;
use crate::trainer::GbdtClassifier;

/// BLAKE3 fingerprints of every feature matrix of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixFingerprints {
    pub training: String,
    pub validation: String,
    pub test: String,
}

/// Files written by a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputFiles {
    pub submission: PathBuf,
    pub model: PathBuf,
    pub model_hash: PathBuf,
    pub report: PathBuf,
    pub features: Option<PathBuf>,
}

/// Summary of one pipeline run, also written as `report.json`
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub version: String,
    pub generated_at: String,
    pub training_rows: usize,
    pub validation_rows: usize,
    pub test_rows: usize,
    pub features: FittedSummary,
    pub model_hash: String,
    pub trees: usize,
    pub validation: Option<ValidationMetrics>,
    pub fingerprints: MatrixFingerprints,
    pub outputs: OutputFiles,
}

/// Load the configured tables and run the pipeline on them.
pub fn run_pipeline(config: &TrainerConfig) -> Result<PipelineReport> {
    config.validate()?;
    let tables =
        RawTables::load(&config.data).map_err(|e| TrainerError::Dataset(format!("{e:#}")))?;
    run_with_tables(config, &tables)
}

fn select(records: &[InspectionRecord], indices: &[usize]) -> Vec<InspectionRecord> {
    indices.iter().map(|&i| records[i].clone()).collect()
}

fn labels_of(matrix: &FeatureMatrix, set: &str) -> Result<Vec<bool>> {
    matrix
        .labels()
        .map(<[bool]>::to_vec)
        .ok_or_else(|| TrainerError::Dataset(format!("{set} inspections are missing labels")))
}

/// Run on tables already in memory.
#[instrument(skip_all, fields(train = tables.train.len(), test = tables.test.len()))]
pub fn run_with_tables(config: &TrainerConfig, tables: &RawTables) -> Result<PipelineReport> {
    config.validate()?;

    let split = train_validation_split(
        tables.train.len(),
        config.split.validation_fraction,
        config.split.seed,
    );
    let fit_rows = select(&tables.train, &split.train);
    let validation_rows = select(&tables.train, &split.validation);
    info!(
        training = fit_rows.len(),
        validation = validation_rows.len(),
        seed = config.split.seed,
        "Split labelled inspections"
    );

    let prepared = prepare_features(
        &fit_rows,
        &[&validation_rows, &tables.test],
        &tables.violations,
        &tables.venues,
        &config.features,
    )?;
    let [validation, test]: [FeatureMatrix; 2] = prepared
        .evaluation
        .try_into()
        .map_err(|_| TrainerError::Training("expected two evaluation matrices".into()))?;
    let training = prepared.training;

    let train_labels = labels_of(&training, "training")?;
    let mut classifier = GbdtClassifier::new(config.model.clone());
    classifier.fit(&training, &train_labels)?;

    let mut baseline = PriorClassifier::new();
    baseline.fit(&training, &train_labels)?;

    let metrics = if validation.n_rows() == 0 {
        warn!("No validation rows; skipping holdout evaluation");
        None
    } else {
        let labels = labels_of(&validation, "validation")?;
        let predicted = classifier.predict_probability(&validation)?;
        let prior = baseline.predict_probability(&validation)?;
        let metrics = ValidationMetrics::compute(&labels, &predicted, &prior)?;
        info!(
            log_loss = metrics.log_loss,
            accuracy = metrics.accuracy,
            baseline_log_loss = metrics.baseline_log_loss,
            "Validation"
        );
        Some(metrics)
    };

    let test_probabilities = classifier.predict_probability(&test)?;
    let model = classifier
        .into_model()
        .ok_or_else(|| TrainerError::Training("classifier produced no model".into()))?;

    let fingerprints = MatrixFingerprints {
        training: training.fingerprint(),
        validation: validation.fingerprint(),
        test: test.fingerprint(),
    };
    let (outputs, model_hash) = write_outputs(config, &model, &training, &test, &test_probabilities)?;

    let report = PipelineReport {
        version: crate::VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        training_rows: training.n_rows(),
        validation_rows: validation.n_rows(),
        test_rows: test.n_rows(),
        features: prepared.summary,
        model_hash,
        trees: model.num_trees(),
        validation: metrics,
        fingerprints,
        outputs,
    };
    std::fs::write(&report.outputs.report, serde_json::to_string_pretty(&report)?)?;

    info!(
        submission = %report.outputs.submission.display(),
        model_hash = %report.model_hash,
        "Run complete"
    );
    Ok(report)
}

fn write_outputs(
    config: &TrainerConfig,
    model: &GbdtModel,
    training: &FeatureMatrix,
    test: &FeatureMatrix,
    test_probabilities: &[f64],
) -> Result<(OutputFiles, String)> {
    let dir: &Path = &config.output.dir;
    std::fs::create_dir_all(dir)?;

    let submission = dir.join(&config.output.submission);
    write_submission_file(&submission, test.ids(), test_probabilities)?;

    let model_path = dir.join("model.json");
    model.save_json(&model_path)?;
    let hash = model.hash_hex()?;
    let hash_path = dir.join("model.hash");
    std::fs::write(&hash_path, &hash)?;

    let features = if config.output.dump_features {
        let path = dir.join("features_train.csv");
        training.write_csv(File::create(&path)?)?;
        Some(path)
    } else {
        None
    };

    let outputs = OutputFiles {
        submission,
        model: model_path,
        model_hash: hash_path,
        report: dir.join("report.json"),
        features,
    };
    Ok((outputs, hash))
}
