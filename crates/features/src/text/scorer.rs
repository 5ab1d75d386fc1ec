//! Differential text score of a single violation description

use super::frequency::DifferentialTable;
use super::matcher::SubstringMatcher;
use crate::errors::Result;

/// Sums the differential value of every table word found in a description.
#[derive(Debug, Clone)]
pub struct TextScorer {
    table: DifferentialTable,
    values: Vec<f64>,
    matcher: SubstringMatcher,
}

impl TextScorer {
    pub fn new(table: DifferentialTable) -> Result<Self> {
        let (words, values): (Vec<String>, Vec<f64>) =
            table.iter().map(|(w, v)| (w.to_string(), v)).unzip();
        let matcher = SubstringMatcher::new(words)?;
        Ok(Self {
            table,
            values,
            matcher,
        })
    }

    pub fn table(&self) -> &DifferentialTable {
        &self.table
    }

    /// Score a lowercased description.
    ///
    /// A word counts once however often it occurs, and it counts when it is
    /// merely a substring of a longer word. Summation follows lexical word
    /// order, so the result is bit-identical to [`Self::score_by_scan`]. A
    /// scorer that sums in table insertion order can differ in the last few
    /// ULPs.
    pub fn score(&self, description: &str) -> f64 {
        self.matcher
            .present(description)
            .into_iter()
            .fold(0.0, |sum, idx| sum + self.values[idx])
    }

    /// Reference implementation: test every table word with `str::contains`.
    pub fn score_by_scan(&self, description: &str) -> f64 {
        self.table
            .iter()
            .filter(|(word, _)| description.contains(word))
            .fold(0.0, |sum, (_, value)| sum + value)
    }
}
