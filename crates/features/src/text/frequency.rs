//! Relative word frequencies and the failed-minus-passed differential table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::tokenizer::tokenize;

/// Word counts for one outcome class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordFrequencies {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl WordFrequencies {
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut freqs = Self::default();
        for token in tokens {
            *freqs.counts.entry(token).or_insert(0) += 1;
            freqs.total += 1;
        }
        freqs
    }

    /// Tokenize every description of a class as one concatenated corpus.
    pub fn from_descriptions<'a, I>(descriptions: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::from_tokens(descriptions.into_iter().flat_map(tokenize))
    }

    /// Total token count
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.counts.contains_key(word)
    }

    /// Distinct words in lexical order
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// count / total, `None` for words never seen
    pub fn relative(&self, word: &str) -> Option<f64> {
        let count = *self.counts.get(word)?;
        Some(count as f64 / self.total as f64)
    }

    /// The `n` most frequent words, ties broken lexically
    pub fn most_common(&self, n: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(word, &count)| (word.as_str(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Word → (failed relative frequency − passed relative frequency)
///
/// Only words seen in both classes get an entry; a word unique to one class
/// carries no differential signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DifferentialTable {
    entries: BTreeMap<String, f64>,
}

impl DifferentialTable {
    pub fn fit(failed: &WordFrequencies, passed: &WordFrequencies) -> Self {
        let entries = failed
            .counts
            .keys()
            .filter_map(|word| {
                let f = failed.relative(word)?;
                let p = passed.relative(word)?;
                Some((word.clone(), f - p))
            })
            .collect();
        Self { entries }
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, word: &str) -> Option<f64> {
        self.entries.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in lexical word order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(w, &v)| (w.as_str(), v))
    }

    /// Words most associated with failing (largest positive differential)
    pub fn most_failing(&self, n: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Words most associated with passing (most negative differential)
    pub fn most_passing(&self, n: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> (WordFrequencies, WordFrequencies) {
        let failed = WordFrequencies::from_descriptions([
            "Live roaches present in kitchen",
            "Evidence of mice in kitchen",
        ]);
        let passed = WordFrequencies::from_descriptions([
            "Kitchen floor not maintained",
            "Thermometer not provided",
            "Evidence of mice near bar",
        ]);
        (failed, passed)
    }

    #[test]
    fn test_relative_frequency() {
        let (failed, _) = corpus();
        // live roaches present kitchen evidence mice kitchen
        assert_eq!(failed.total(), 7);
        assert_eq!(failed.count("kitchen"), 2);
        assert_eq!(failed.relative("kitchen"), Some(2.0 / 7.0));
        assert_eq!(failed.relative("bar"), None);
    }

    #[test]
    fn test_differential_is_intersection() {
        let (failed, passed) = corpus();
        let table = DifferentialTable::fit(&failed, &passed);

        let words: Vec<&str> = table.iter().map(|(w, _)| w).collect();
        assert_eq!(words, vec!["evidence", "kitchen", "mice"]);

        for (word, _) in table.iter() {
            assert!(failed.contains(word));
            assert!(passed.contains(word));
        }
        assert_eq!(table.get("roaches"), None);
        assert_eq!(table.get("thermometer"), None);
    }

    #[test]
    fn test_differential_values() {
        let (failed, passed) = corpus();
        let table = DifferentialTable::fit(&failed, &passed);
        // passed tokens: kitchen floor maintained thermometer provided evidence mice near bar
        let expected = 2.0 / 7.0 - 1.0 / 9.0;
        assert_eq!(table.get("kitchen"), Some(expected));
        assert_eq!(table.get("mice"), Some(1.0 / 7.0 - 1.0 / 9.0));
    }

    #[test]
    fn test_empty_class_yields_empty_table() {
        let (failed, _) = corpus();
        let table = DifferentialTable::fit(&failed, &WordFrequencies::default());
        assert!(table.is_empty());
    }

    #[test]
    fn test_most_common_ordering() {
        let freqs = WordFrequencies::from_descriptions(["rats rats mice flies flies"]);
        assert_eq!(freqs.most_common(2), vec![("flies", 2), ("rats", 2)]);
    }

    #[test]
    fn test_extremes() {
        let table = DifferentialTable::from_entries([
            ("mice".to_string(), 0.2),
            ("floor".to_string(), -0.1),
            ("sink".to_string(), 0.05),
        ]);
        assert_eq!(table.most_failing(1), vec![("mice", 0.2)]);
        assert_eq!(table.most_passing(1), vec![("floor", -0.1)]);
    }
}
