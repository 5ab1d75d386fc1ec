//! Holdout evaluation metrics

use serde::Serialize;

use crate::errors::{Result, TrainerError};

/// Probabilities are clipped to `[EPS, 1 - EPS]` before taking logs.
const EPS: f64 = 1e-15;

fn check_lengths(labels: &[bool], probabilities: &[f64]) -> Result<()> {
    if labels.len() != probabilities.len() {
        return Err(TrainerError::Training(format!(
            "{} labels but {} predictions",
            labels.len(),
            probabilities.len()
        )));
    }
    if labels.is_empty() {
        return Err(TrainerError::Training("cannot score an empty set".into()));
    }
    Ok(())
}

/// Mean binary cross-entropy of pass probabilities.
pub fn log_loss(labels: &[bool], probabilities: &[f64]) -> Result<f64> {
    check_lengths(labels, probabilities)?;
    let total: f64 = labels
        .iter()
        .zip(probabilities)
        .map(|(&passed, &p)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            if passed {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    Ok(total / labels.len() as f64)
}

/// Share of rows where `p > 0.5` agrees with the label.
pub fn accuracy(labels: &[bool], probabilities: &[f64]) -> Result<f64> {
    check_lengths(labels, probabilities)?;
    let correct = labels
        .iter()
        .zip(probabilities)
        .filter(|(passed, p)| (**p > 0.5) == **passed)
        .count();
    Ok(correct as f64 / labels.len() as f64)
}

/// Validation scores of the model next to the constant pass-rate baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationMetrics {
    pub rows: usize,
    pub log_loss: f64,
    pub accuracy: f64,
    pub baseline_log_loss: f64,
}

impl ValidationMetrics {
    pub fn compute(labels: &[bool], model: &[f64], baseline: &[f64]) -> Result<Self> {
        Ok(Self {
            rows: labels.len(),
            log_loss: log_loss(labels, model)?,
            accuracy: accuracy(labels, model)?,
            baseline_log_loss: log_loss(labels, baseline)?,
        })
    }
}
