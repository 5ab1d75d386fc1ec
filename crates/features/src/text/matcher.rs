//! Multi-pattern substring containment
//!
//! Answers "which of these words occur anywhere inside this text" with one
//! pass over the text. Matching is raw containment, not token-bounded:
//! `"rat"` is found inside `"grate"`.

use aho_corasick::{AhoCorasick, MatchKind};

use crate::errors::{FeatureError, Result};

#[derive(Debug, Clone)]
pub struct SubstringMatcher {
    patterns: Vec<String>,
    automaton: Option<AhoCorasick>,
}

impl SubstringMatcher {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if let Some(idx) = patterns.iter().position(|p| p.is_empty()) {
            return Err(FeatureError::Matcher(format!("pattern {idx} is empty")));
        }

        let automaton = if patterns.is_empty() {
            None
        } else {
            // Overlapping search needs standard semantics.
            let ac = AhoCorasick::builder()
                .match_kind(MatchKind::Standard)
                .build(&patterns)
                .map_err(|e| FeatureError::Matcher(e.to_string()))?;
            Some(ac)
        };

        Ok(Self {
            patterns,
            automaton,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Indices of every pattern contained in `haystack`, ascending.
    pub fn present(&self, haystack: &str) -> Vec<usize> {
        let Some(ac) = &self.automaton else {
            return Vec::new();
        };
        let mut seen = vec![false; self.patterns.len()];
        for m in ac.find_overlapping_iter(haystack) {
            seen[m.pattern().as_usize()] = true;
        }
        seen.iter()
            .enumerate()
            .filter_map(|(idx, &hit)| hit.then_some(idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_patterns_all_reported() {
        let matcher = SubstringMatcher::new(["rat", "rats", "ats", "mice"]).unwrap();
        assert_eq!(matcher.present("rats"), vec![0, 1, 2]);
    }

    #[test]
    fn test_substring_not_token_bounded() {
        let matcher = SubstringMatcher::new(["rat", "live"]).unwrap();
        assert_eq!(matcher.present("grate delivered"), vec![0, 1]);
    }

    #[test]
    fn test_no_patterns() {
        let matcher = SubstringMatcher::new(Vec::<String>::new()).unwrap();
        assert!(matcher.present("anything").is_empty());
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let err = SubstringMatcher::new(["mice", ""]).unwrap_err();
        assert!(matches!(err, FeatureError::Matcher(_)));
    }

    #[test]
    fn test_agrees_with_naive_contains() {
        let words = ["food", "foo", "od", "contact", "surface", "ace", "not"];
        let matcher = SubstringMatcher::new(words).unwrap();
        let text = "food contact surface not properly maintained";
        let naive: Vec<usize> = words
            .iter()
            .enumerate()
            .filter_map(|(i, w)| text.contains(w).then_some(i))
            .collect();
        assert_eq!(matcher.present(text), naive);
    }
}
