//! Pipeline configuration
//!
//! Layered the usual way: built-in defaults, then an optional TOML file, then
//! `INSPECTA_*` environment variables, then command-line flags.

use inspecta_features::FeatureConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::{Result, TrainerError};
use crate::trainer::GbdtConfig;

/// Full trainer configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub data: DataConfig,
    pub split: SplitConfig,
    pub features: FeatureConfig,
    pub model: GbdtConfig,
    pub output: OutputConfig,
}

/// Input table locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub train: PathBuf,
    pub test: PathBuf,
    pub violations: PathBuf,
    pub venues: PathBuf,
}

/// Holdout split of the labelled inspections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of labelled rows held out for validation, in `[0, 1)`
    pub validation_fraction: f64,
    pub seed: u64,
}

/// Output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub submission: String,
    /// Also write the training feature matrix as CSV
    pub dump_features: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            train: PathBuf::from("data/inspections_train.csv"),
            test: PathBuf::from("data/inspections_test.csv"),
            violations: PathBuf::from("data/violations.csv"),
            venues: PathBuf::from("data/venues.csv"),
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            validation_fraction: 0.25,
            seed: 1,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            submission: "submission.csv".to_string(),
            dump_features: false,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| TrainerError::Config(format!("{name}: cannot parse '{raw}'")))
}

impl TrainerConfig {
    /// Load a TOML file; sections and keys it leaves out keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            TrainerError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TrainerError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `INSPECTA_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source; unparseable values are errors.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("INSPECTA_TRAIN") {
            self.data.train = PathBuf::from(val);
        }
        if let Some(val) = lookup("INSPECTA_TEST") {
            self.data.test = PathBuf::from(val);
        }
        if let Some(val) = lookup("INSPECTA_VIOLATIONS") {
            self.data.violations = PathBuf::from(val);
        }
        if let Some(val) = lookup("INSPECTA_VENUES") {
            self.data.venues = PathBuf::from(val);
        }
        if let Some(val) = lookup("INSPECTA_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("INSPECTA_SEED") {
            self.split.seed = parse_var("INSPECTA_SEED", &val)?;
        }
        if let Some(val) = lookup("INSPECTA_VALIDATION_FRACTION") {
            self.split.validation_fraction = parse_var("INSPECTA_VALIDATION_FRACTION", &val)?;
        }
        if let Some(val) = lookup("INSPECTA_TREES") {
            self.model.num_trees = parse_var("INSPECTA_TREES", &val)?;
        }
        if let Some(val) = lookup("INSPECTA_MAX_DEPTH") {
            self.model.max_depth = parse_var("INSPECTA_MAX_DEPTH", &val)?;
        }
        if let Some(val) = lookup("INSPECTA_LEARNING_RATE") {
            self.model.learning_rate = parse_var("INSPECTA_LEARNING_RATE", &val)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let fraction = self.split.validation_fraction;
        if !(0.0..1.0).contains(&fraction) {
            return Err(TrainerError::Config(format!(
                "validation_fraction must be in [0, 1), got {fraction}"
            )));
        }
        if self.output.submission.trim().is_empty() {
            return Err(TrainerError::Config("submission file name is empty".into()));
        }
        self.model.validate()?;
        self.features.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_is_valid() {
        let config = TrainerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.split.validation_fraction, 0.25);
        assert_eq!(config.output.submission, "submission.csv");
    }

    #[test]
    fn test_partial_toml() {
        let config: TrainerConfig = toml::from_str(
            r#"
            [data]
            train = "in/train.csv"

            [model]
            num_trees = 25

            [features]
            venue_columns = ["score"]
            "#,
        )
        .unwrap();

        assert_eq!(config.data.train, PathBuf::from("in/train.csv"));
        assert_eq!(config.data.test, PathBuf::from("data/inspections_test.csv"));
        assert_eq!(config.model.num_trees, 25);
        assert_eq!(config.model.max_depth, GbdtConfig::default().max_depth);
        assert_eq!(config.features.venue_columns, vec!["score"]);
        assert_eq!(config.features.extreme_keywords.len(), 11);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inspecta.toml");
        let mut config = TrainerConfig::default();
        config.split.seed = 99;
        config.save_to_file(&path).unwrap();
        assert_eq!(TrainerConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("INSPECTA_SEED", "7"),
            ("INSPECTA_TREES", "12"),
            ("INSPECTA_OUTPUT_DIR", "/tmp/out"),
        ]
        .into_iter()
        .collect();

        let mut config = TrainerConfig::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.split.seed, 7);
        assert_eq!(config.model.num_trees, 12);
        assert_eq!(config.output.dir, PathBuf::from("/tmp/out"));

        let err = config
            .apply_overrides(|name| (name == "INSPECTA_SEED").then(|| "seven".to_string()))
            .unwrap_err();
        assert!(matches!(err, TrainerError::Config(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = TrainerConfig::default();
        config.split.validation_fraction = 1.0;
        assert!(config.validate().is_err());

        let mut config = TrainerConfig::default();
        config.model.num_trees = 0;
        assert!(config.validate().is_err());

        let mut config = TrainerConfig::default();
        config.features.extreme_keywords = vec!["Rats".into()];
        assert!(matches!(config.validate(), Err(TrainerError::Features(_))));
    }
}
