//! Gradient-boosted tree classifier
//!
//! Binary logistic boosting over fixed-point features: every round fits one
//! CART tree to the log-loss gradients of the current predictions.

use inspecta_features::{Classifier, FeatureError, FeatureMatrix};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::cart::{CartBuilder, TreeConfig};
use crate::errors::{Result, TrainerError};
use crate::gbdt::{quantize_matrix, sigmoid, GbdtModel, SCALE};

/// Boosting configuration; fixed-point values use `SCALE` = 1e6
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbdtConfig {
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fixed-point, e.g. 100_000 = 0.1
    pub learning_rate: i64,
    /// Fixed-point L2 regularization on leaf values
    pub lambda: i64,
    /// Fixed-point minimum split gain
    pub min_gain: i64,
}

impl Default for GbdtConfig {
    fn default() -> Self {
        Self {
            num_trees: 200,
            max_depth: 6,
            min_samples_leaf: 10,
            learning_rate: 100_000,
            lambda: SCALE,
            min_gain: 0,
        }
    }
}

impl GbdtConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_trees == 0 {
            return Err(TrainerError::Config("num_trees must be positive".into()));
        }
        if self.max_depth == 0 {
            return Err(TrainerError::Config("max_depth must be positive".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(TrainerError::Config("min_samples_leaf must be positive".into()));
        }
        if self.learning_rate <= 0 || self.learning_rate > SCALE {
            return Err(TrainerError::Config(format!(
                "learning_rate must be in (0, {SCALE}], got {}",
                self.learning_rate
            )));
        }
        if self.lambda < 0 || self.min_gain < 0 {
            return Err(TrainerError::Config(
                "lambda and min_gain must not be negative".into(),
            ));
        }
        Ok(())
    }

    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            lambda: self.lambda,
            min_gain: self.min_gain,
        }
    }
}

/// Log-odds of the observed pass rate, clamped away from 0 and 1.
pub fn prior_log_odds(passes: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    let p = (passes as f64 / total as f64).clamp(1e-6, 1.0 - 1e-6);
    ((p / (1.0 - p)).ln() * SCALE as f64).round() as i64
}

/// Per-row log-loss gradient `p - y` and hessian `p (1 - p)`, fixed-point.
fn gradients_hessians(labels: &[bool], predictions: &[i64]) -> (Vec<i64>, Vec<i64>) {
    labels
        .iter()
        .zip(predictions)
        .map(|(&passed, &logit)| {
            let p = sigmoid(logit);
            let y = if passed { 1.0 } else { 0.0 };
            let gradient = ((p - y) * SCALE as f64).round() as i64;
            let hessian = ((p * (1.0 - p) * SCALE as f64).round() as i64).max(1);
            (gradient, hessian)
        })
        .unzip()
}

/// Deterministic trainer producing a [`GbdtModel`]
pub struct GbdtTrainer {
    config: GbdtConfig,
}

impl GbdtTrainer {
    pub fn new(config: GbdtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GbdtConfig {
        &self.config
    }

    #[instrument(skip_all, fields(rows = features.n_rows(), columns = features.n_cols()))]
    pub fn train(&self, features: &FeatureMatrix, labels: &[bool]) -> Result<GbdtModel> {
        self.config.validate()?;
        if labels.len() != features.n_rows() {
            return Err(TrainerError::Training(format!(
                "expected {} labels, got {}",
                features.n_rows(),
                labels.len()
            )));
        }
        if labels.is_empty() {
            return Err(TrainerError::Training("no training rows".into()));
        }

        let rows = quantize_matrix(features);
        let passes = labels.iter().filter(|&&p| p).count();
        let bias = prior_log_odds(passes, labels.len());
        let mut predictions = vec![bias; rows.len()];
        let mut trees = Vec::with_capacity(self.config.num_trees);

        for round in 0..self.config.num_trees {
            let (gradients, hessians) = gradients_hessians(labels, &predictions);
            let builder =
                CartBuilder::new(&rows, &gradients, &hessians, self.config.tree_config())?;
            let tree = builder.build(self.config.learning_rate);

            for (prediction, row) in predictions.iter_mut().zip(&rows) {
                let step = (tree.evaluate(row) as i128 * tree.weight as i128) / SCALE as i128;
                *prediction = prediction.saturating_add(step as i64);
            }

            debug!(tree = round + 1, splits = tree.n_splits(), "fitted tree");
            trees.push(tree);
        }

        let model = GbdtModel::new(features.schema().columns().to_vec(), bias, trees);
        info!(
            trees = model.num_trees(),
            bias = model.bias,
            "Training complete"
        );
        Ok(model)
    }
}

fn into_feature_error(err: TrainerError) -> FeatureError {
    match err {
        TrainerError::Features(inner) => inner,
        other => FeatureError::Classifier(other.to_string()),
    }
}

/// [`Classifier`] backed by the boosted-tree trainer
pub struct GbdtClassifier {
    trainer: GbdtTrainer,
    model: Option<GbdtModel>,
}

impl GbdtClassifier {
    pub fn new(config: GbdtConfig) -> Self {
        Self {
            trainer: GbdtTrainer::new(config),
            model: None,
        }
    }

    /// Fitted model, if `fit` has run
    pub fn model(&self) -> Option<&GbdtModel> {
        self.model.as_ref()
    }

    pub fn into_model(self) -> Option<GbdtModel> {
        self.model
    }
}

impl Classifier for GbdtClassifier {
    fn fit(&mut self, features: &FeatureMatrix, labels: &[bool]) -> inspecta_features::Result<()> {
        let model = self
            .trainer
            .train(features, labels)
            .map_err(into_feature_error)?;
        self.model = Some(model);
        Ok(())
    }

    fn predict_probability(&self, features: &FeatureMatrix) -> inspecta_features::Result<Vec<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| FeatureError::Classifier("classifier not fitted".into()))?;
        model.predict_probability(features).map_err(into_feature_error)
    }
}
