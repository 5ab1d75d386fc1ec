//! Contract between the feature pipeline and a learning algorithm

use crate::errors::{FeatureError, Result};
use crate::table::{FeatureMatrix, FeatureSchema};

/// Binary classifier over feature matrices.
///
/// Implementations must reject matrices whose schema differs from the one they
/// were fitted on.
pub trait Classifier {
    fn fit(&mut self, features: &FeatureMatrix, labels: &[bool]) -> Result<()>;

    /// Probability of passing, one value in `[0, 1]` per row
    fn predict_probability(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;
}

/// Predicts the training pass rate for every row; the baseline every model
/// has to beat.
#[derive(Debug, Clone, Default)]
pub struct PriorClassifier {
    fitted: Option<(FeatureSchema, f64)>,
}

impl PriorClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass_rate(&self) -> Option<f64> {
        self.fitted.as_ref().map(|(_, rate)| *rate)
    }
}

impl Classifier for PriorClassifier {
    fn fit(&mut self, features: &FeatureMatrix, labels: &[bool]) -> Result<()> {
        if labels.len() != features.n_rows() || labels.is_empty() {
            return Err(FeatureError::Classifier(format!(
                "expected {} labels, got {}",
                features.n_rows(),
                labels.len()
            )));
        }
        let passes = labels.iter().filter(|&&p| p).count();
        let rate = passes as f64 / labels.len() as f64;
        self.fitted = Some((features.schema().clone(), rate));
        Ok(())
    }

    fn predict_probability(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        let (schema, rate) = self
            .fitted
            .as_ref()
            .ok_or_else(|| FeatureError::Classifier("classifier not fitted".into()))?;
        features.ensure_schema(schema)?;
        Ok(vec![*rate; features.n_rows()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(columns: &[&str], rows: usize) -> FeatureMatrix {
        let schema = FeatureSchema::from_columns(columns.iter().map(|c| c.to_string()).collect());
        FeatureMatrix::new(
            schema,
            (0..rows).map(|i| i.to_string()).collect(),
            vec![vec![0.0; columns.len()]; rows],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_prior_predicts_pass_rate() {
        let mut clf = PriorClassifier::new();
        let train = matrix(&["a"], 4);
        clf.fit(&train, &[true, true, false, true]).unwrap();
        assert_eq!(clf.pass_rate(), Some(0.75));
        assert_eq!(clf.predict_probability(&matrix(&["a"], 2)).unwrap(), vec![0.75, 0.75]);
    }

    #[test]
    fn test_prior_rejects_other_schema() {
        let mut clf = PriorClassifier::new();
        clf.fit(&matrix(&["a"], 1), &[true]).unwrap();
        assert!(clf.predict_probability(&matrix(&["b"], 1)).is_err());
    }

    #[test]
    fn test_unfitted_errors() {
        let clf = PriorClassifier::new();
        assert!(clf.predict_probability(&matrix(&["a"], 1)).is_err());
    }
}
