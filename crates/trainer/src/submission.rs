//! Submission file writer
//!
//! One `Id,Predicted` row per test inspection, in input order.

use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::errors::{Result, TrainerError};

#[derive(Serialize)]
struct SubmissionRow<'a> {
    #[serde(rename = "Id")]
    id: &'a str,
    #[serde(rename = "Predicted")]
    predicted: f64,
}

/// Write predictions as CSV with exactly the columns `Id` and `Predicted`.
pub fn write_submission<W: Write>(writer: W, ids: &[String], probabilities: &[f64]) -> Result<()> {
    if ids.len() != probabilities.len() {
        return Err(TrainerError::Dataset(format!(
            "{} test rows but {} predictions",
            ids.len(),
            probabilities.len()
        )));
    }
    if let Some(p) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(TrainerError::Model(format!("prediction {p} outside [0, 1]")));
    }

    let mut out = csv::Writer::from_writer(writer);
    if ids.is_empty() {
        out.write_record(["Id", "Predicted"])?;
    }
    for (id, &predicted) in ids.iter().zip(probabilities) {
        out.serialize(SubmissionRow { id, predicted })?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_submission_file<P: AsRef<Path>>(
    path: P,
    ids: &[String],
    probabilities: &[f64],
) -> Result<()> {
    let file = File::create(path)?;
    write_submission(file, ids, probabilities)
}
