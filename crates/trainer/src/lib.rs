//! Inspecta trainer - deterministic boosted-tree classifier and run pipeline
//!
//! Loads the raw inspection tables, builds feature matrices with
//! `inspecta-features`, trains a fixed-point GBDT and writes the submission,
//! the hashed model and a run report.

pub mod cart;
pub mod config;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod gbdt;
pub mod metrics;
pub mod pipeline;
pub mod submission;
pub mod trainer;

pub use config::{DataConfig, OutputConfig, SplitConfig, TrainerConfig};
pub use dataset::RawTables;
pub use deterministic::{train_validation_split, LcgRng, SplitIndices, SplitTieBreaker};
pub use errors::{Result, TrainerError};
pub use gbdt::GbdtModel;
pub use metrics::{accuracy, log_loss, ValidationMetrics};
pub use pipeline::{run_pipeline, run_with_tables, PipelineReport};
pub use trainer::{GbdtClassifier, GbdtConfig, GbdtTrainer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
