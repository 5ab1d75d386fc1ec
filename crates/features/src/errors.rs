//! Error types for the feature pipeline

use thiserror::Error;

/// Errors that can occur while fitting encoders or building feature tables
#[derive(Error, Debug)]
pub enum FeatureError {
    /// Borough value with no entry in the fixed encoding table
    #[error("Unknown borough '{0}': extend the borough encoding table")]
    UnknownBorough(String),

    /// Training inspection without an outcome label
    #[error("Inspection '{id}' has no `passed` label but was used for fitting")]
    MissingLabel { id: String },

    /// Lookup table keyed by a column that is not unique
    #[error("Duplicate key {key} in {table} table")]
    DuplicateKey { table: &'static str, key: String },

    /// Left join changed the number of rows
    #[error("Join with {table} changed row count from {before} to {after}")]
    JoinCardinality {
        table: &'static str,
        before: usize,
        after: usize,
    },

    /// Two matrices (or a model and a matrix) disagree on columns
    #[error("Feature schema mismatch: expected {expected:?}, got {actual:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// Date text that none of the accepted formats parse
    #[error("Invalid inspection date '{0}'")]
    InvalidDate(String),

    /// Invalid pipeline configuration
    #[error("Invalid feature configuration: {0}")]
    InvalidConfig(String),

    /// Substring automaton could not be built
    #[error("Failed to build substring matcher: {0}")]
    Matcher(String),

    /// Classifier contract violation
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for feature pipeline operations
pub type Result<T> = std::result::Result<T, FeatureError>;
