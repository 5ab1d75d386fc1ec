//! Violation-text signals
//!
//! - `tokenizer`: lowercase alphabetic tokens with English stopwords removed
//! - `frequency`: per-class relative word frequencies and their differential
//! - `matcher`: multi-pattern substring containment
//! - `scorer`: differential score of a description
//! - `keywords`: extreme-keyword presence

pub mod frequency;
pub mod keywords;
pub mod matcher;
pub mod scorer;
pub mod tokenizer;

pub use frequency::{DifferentialTable, WordFrequencies};
pub use keywords::{KeywordExtractor, DEFAULT_EXTREME_KEYWORDS};
pub use matcher::SubstringMatcher;
pub use scorer::TextScorer;
pub use tokenizer::{is_stopword, tokenize};

/// Normalize a description before substring matching.
pub fn normalize_description(text: &str) -> String {
    text.to_lowercase()
}
