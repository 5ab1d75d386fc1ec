//! Extreme-keyword presence

use super::matcher::SubstringMatcher;
use crate::errors::Result;

/// Keywords whose presence in a violation marks a severe condition.
/// `âºf` is a mis-decoded `°F` that survives in the source text.
pub const DEFAULT_EXTREME_KEYWORDS: &[&str] = &[
    "flies",
    "vermin",
    "harborage",
    "mice",
    "live",
    "filth",
    "refuse",
    "sewage",
    "rats",
    "âºf",
    "roaches",
];

/// Finds which keywords of a fixed, ordered list occur in a description.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    matcher: SubstringMatcher,
}

impl KeywordExtractor {
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            matcher: SubstringMatcher::new(keywords)?,
        })
    }

    /// The keyword vocabulary, in column order
    pub fn keywords(&self) -> &[String] {
        self.matcher.patterns()
    }

    /// Keywords contained in a lowercased description, in vocabulary order.
    pub fn extract(&self, description: &str) -> Vec<String> {
        self.matcher
            .present(description)
            .into_iter()
            .map(|idx| self.keywords()[idx].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_extractor() -> KeywordExtractor {
        KeywordExtractor::new(DEFAULT_EXTREME_KEYWORDS.iter().copied()).unwrap()
    }

    #[test]
    fn test_extract_in_list_order() {
        let extractor = KeywordExtractor::new(["rats", "roaches", "mice"]).unwrap();
        assert_eq!(
            extractor.extract("rats and roaches seen,"),
            vec!["rats".to_string(), "roaches".to_string()]
        );
    }

    #[test]
    fn test_extract_follows_vocabulary_not_text_order() {
        let extractor = KeywordExtractor::new(["rats", "roaches", "mice"]).unwrap();
        assert_eq!(
            extractor.extract("roaches, mice and rats"),
            vec!["rats", "roaches", "mice"]
        );
    }

    #[test]
    fn test_substring_quirk() {
        let extractor = default_extractor();
        // "live" inside "delivery", "refuse" inside "refused"
        assert_eq!(
            extractor.extract("delivery refused at door"),
            vec!["live", "refuse"]
        );

        let extractor = KeywordExtractor::new(["mice"]).unwrap();
        assert_eq!(extractor.extract("mices observed"), vec!["mice"]);
    }

    #[test]
    fn test_ocr_artifact_keyword() {
        let extractor = default_extractor();
        assert_eq!(
            extractor.extract("cold food held above 41âºf"),
            vec!["âºf"]
        );
    }

    #[test]
    fn test_nothing_found() {
        let extractor = default_extractor();
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("sanitizer not provided").is_empty());
    }
}
