//! Boosted-tree model with fixed-point inference
//!
//! Trees hold integer thresholds and leaf values at [`SCALE`] precision. The
//! model records the feature columns it was trained on and refuses matrices
//! with any other schema. Serialized form is canonical JSON (sorted keys, no
//! whitespace) so its BLAKE3 hash identifies the model.

use inspecta_features::{FeatureMatrix, FeatureSchema};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{Result, TrainerError};

/// Fixed-point scale factor (1e6)
pub const SCALE: i64 = 1_000_000;

/// Quantized value of a missing feature; compares `<=` every threshold, so
/// missing values always take the left branch.
pub const MISSING: i64 = i64::MIN;

/// Quantize a feature value to fixed point; `NaN` maps to [`MISSING`].
pub fn quantize(value: f64) -> i64 {
    if value.is_nan() {
        return MISSING;
    }
    ((value * SCALE as f64).round() as i64).max(MISSING + 1)
}

/// Quantize every row of a matrix.
pub fn quantize_matrix(features: &FeatureMatrix) -> Vec<Vec<i64>> {
    features
        .rows()
        .iter()
        .map(|row| row.iter().map(|&v| quantize(v)).collect())
        .collect()
}

/// Logistic function of a fixed-point log-odds value.
pub fn sigmoid(logit: i64) -> f64 {
    let z = logit as f64 / SCALE as f64;
    1.0 / (1.0 + (-z).exp())
}

/// A tree node; leaves carry `feature_idx == -1` and a `leaf` value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Node {
    pub id: i32,
    pub left: i32,
    pub right: i32,
    pub feature_idx: i32,
    pub threshold: i64,
    pub leaf: Option<i64>,
}

impl Node {
    pub fn internal(id: i32, feature_idx: i32, threshold: i64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    pub fn leaf(id: i32, value: i64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// One regression tree over quantized features
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tree {
    /// Node 0 is the root
    pub nodes: Vec<Node>,

    /// Shrinkage applied to every leaf (fixed-point)
    pub weight: i64,
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: i64) -> Self {
        Self { nodes, weight }
    }

    /// Leaf value reached by `features`; `value <= threshold` goes left.
    pub fn evaluate(&self, features: &[i64]) -> i64 {
        let mut idx = 0usize;
        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0;
            };
            if node.is_leaf() {
                return node.leaf.unwrap_or(0);
            }
            let Some(&value) = features.get(node.feature_idx as usize) else {
                return 0;
            };
            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return 0;
            }
            idx = next as usize;
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let n = self.nodes.len() as i32;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.leaf.is_none() {
                    return Err(format!("leaf node {i} has no value"));
                }
                continue;
            }
            if !(0..n).contains(&node.left) || !(0..n).contains(&node.right) {
                return Err(format!("node {i} has a child outside the tree"));
            }
            // Children follow their parent, so evaluation always terminates
            let id = i as i32;
            if node.left <= id || node.right <= id {
                return Err(format!("node {i} points back to itself or an ancestor"));
            }
            if node.feature_idx < 0 {
                return Err(format!("internal node {i} has no feature"));
            }
        }
        Ok(())
    }

    /// Number of internal nodes
    pub fn n_splits(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_leaf()).count()
    }
}

/// Trained ensemble
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtModel {
    /// Model format version
    pub version: i32,

    pub scale: i64,

    /// Feature columns, in the order the trees index them
    pub feature_names: Vec<String>,

    /// Initial log-odds (fixed-point)
    pub bias: i64,

    pub trees: Vec<Tree>,
}

impl GbdtModel {
    pub fn new(feature_names: Vec<String>, bias: i64, trees: Vec<Tree>) -> Self {
        Self {
            version: 1,
            scale: SCALE,
            feature_names,
            bias,
            trees,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TrainerError::Model(format!(
                "unsupported model version {}",
                self.version
            )));
        }
        if self.scale != SCALE {
            return Err(TrainerError::Model(format!("unsupported scale {}", self.scale)));
        }
        let n_features = self.feature_names.len() as i32;
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| TrainerError::Model(format!("tree {i}: {e}")))?;
            if tree.nodes.iter().any(|n| n.feature_idx >= n_features) {
                return Err(TrainerError::Model(format!(
                    "tree {i} references a feature outside the schema"
                )));
            }
        }
        Ok(())
    }

    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema::from_columns(self.feature_names.clone())
    }

    /// Error unless `features` has exactly the columns this model was trained on.
    pub fn ensure_schema(&self, features: &FeatureMatrix) -> Result<()> {
        features.ensure_schema(&self.schema())?;
        Ok(())
    }

    /// Fixed-point log-odds of passing for one quantized row
    pub fn score(&self, features: &[i64]) -> i64 {
        let mut sum = self.bias;
        for tree in &self.trees {
            let contribution = (tree.evaluate(features) as i128 * tree.weight as i128)
                / self.scale as i128;
            sum = sum.saturating_add(contribution as i64);
        }
        sum
    }

    /// Probability of passing for every row of `features`
    pub fn predict_probability(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        self.ensure_schema(features)?;
        Ok(quantize_matrix(features)
            .iter()
            .map(|row| sigmoid(self.score(row)))
            .collect())
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Canonical JSON: `serde_json::Value` objects keep their keys sorted.
    pub fn to_canonical_json(&self) -> Result<String> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::to_string(&value)?)
    }

    /// BLAKE3 of the canonical JSON, hex encoded
    pub fn hash_hex(&self) -> Result<String> {
        let json = self.to_canonical_json()?;
        Ok(hex::encode(blake3::hash(json.as_bytes()).as_bytes()))
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_canonical_json()?)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let model: GbdtModel = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }
}
