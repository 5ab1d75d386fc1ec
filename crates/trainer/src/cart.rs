//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy construction over quantized features with fixed-point
//! gradient statistics. Candidate thresholds are the distinct values of each
//! feature; ties in gain resolve to the lowest (feature, threshold).

use crate::deterministic::SplitTieBreaker;
use crate::errors::{Result, TrainerError};
use crate::gbdt::{Node, Tree, SCALE};

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// L2 regularization on leaf values (fixed-point)
    pub lambda: i64,
    /// Minimum gain a split must exceed (fixed-point)
    pub min_gain: i64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_leaf: 10,
            lambda: SCALE,
            min_gain: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: i64,
    gain: i128,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: i64, gain: i128) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
        }
    }

    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

/// Builds one tree fitted to per-row gradients and hessians
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<i64>],
    gradients: &'a [i64],
    hessians: &'a [i64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a [Vec<i64>],
        gradients: &'a [i64],
        hessians: &'a [i64],
        config: TreeConfig,
    ) -> Result<Self> {
        if features.len() != gradients.len() || features.len() != hessians.len() {
            return Err(TrainerError::Training(format!(
                "{} rows but {} gradients and {} hessians",
                features.len(),
                gradients.len(),
                hessians.len()
            )));
        }
        let feature_count = features.first().map_or(0, Vec::len);
        if features.iter().any(|row| row.len() != feature_count) {
            return Err(TrainerError::Training("ragged feature rows".into()));
        }
        Ok(Self {
            config,
            features,
            gradients,
            hessians,
            feature_count,
        })
    }

    /// Build a tree whose leaves are later scaled by `weight`.
    pub fn build(&self, weight: i64) -> Tree {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..self.features.len()).collect();
        self.build_node(&indices, 0, &mut nodes);
        Tree::new(nodes, weight)
    }

    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> i32 {
        let current = nodes.len() as i32;
        let (sum_g, sum_h) = self.sums(indices);

        let split = if depth >= self.config.max_depth
            || indices.len() < 2 * self.config.min_samples_leaf
        {
            None
        } else {
            self.find_best_split(indices, sum_g, sum_h)
        };

        let Some(split) = split else {
            nodes.push(Node::leaf(current, self.leaf_value(sum_g, sum_h)));
            return current;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.features[i][split.feature_idx] <= split.threshold);

        nodes.push(Node::internal(
            current,
            split.feature_idx as i32,
            split.threshold,
            -1,
            -1,
        ));
        let left_idx = self.build_node(&left, depth + 1, nodes);
        let right_idx = self.build_node(&right, depth + 1, nodes);
        nodes[current as usize].left = left_idx;
        nodes[current as usize].right = right_idx;

        current
    }

    /// Sweep every feature in sorted order, scoring each boundary between
    /// distinct values.
    fn find_best_split(&self, indices: &[usize], sum_g: i64, sum_h: i64) -> Option<SplitCandidate> {
        let parent = self.node_score(sum_g, sum_h);
        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();

        for feature_idx in 0..self.feature_count {
            order.sort_by_key(|&i| (self.features[i][feature_idx], i));

            let mut left_g = 0i64;
            let mut left_h = 0i64;
            for pos in 0..order.len().saturating_sub(1) {
                let row = order[pos];
                left_g = left_g.saturating_add(self.gradients[row]);
                left_h = left_h.saturating_add(self.hessians[row]);

                let value = self.features[row][feature_idx];
                if value == self.features[order[pos + 1]][feature_idx] {
                    continue;
                }
                let n_left = pos + 1;
                if n_left < min_leaf || order.len() - n_left < min_leaf {
                    continue;
                }

                let gain = self.node_score(left_g, left_h)
                    + self.node_score(sum_g - left_g, sum_h - left_h)
                    - parent;
                let candidate = SplitCandidate::new(feature_idx, value, gain);
                if best.as_ref().map_or(true, |b| candidate.beats(b)) {
                    best = Some(candidate);
                }
            }
        }

        best.filter(|b| b.gain > self.config.min_gain as i128)
    }

    fn sums(&self, indices: &[usize]) -> (i64, i64) {
        indices.iter().fold((0i64, 0i64), |(g, h), &i| {
            (
                g.saturating_add(self.gradients[i]),
                h.saturating_add(self.hessians[i]),
            )
        })
    }

    /// G² / (H + λ)
    fn node_score(&self, sum_g: i64, sum_h: i64) -> i128 {
        let denom = sum_h as i128 + self.config.lambda as i128;
        if denom <= 0 {
            return 0;
        }
        (sum_g as i128 * sum_g as i128) / denom
    }

    /// -G / (H + λ), fixed-point
    fn leaf_value(&self, sum_g: i64, sum_h: i64) -> i64 {
        let denom = sum_h as i128 + self.config.lambda as i128;
        if denom <= 0 {
            return 0;
        }
        let value = -(sum_g as i128 * SCALE as i128) / denom;
        value.clamp(i64::MIN as i128 + 1, i64::MAX as i128) as i64
    }
}
