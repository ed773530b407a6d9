// Keyword extraction contract and a lightweight built-in extractor
use ahash::AHashSet;
use tastematch_core::stopwords::is_stop_word;

/// Turns free text into an ordered, de-duplicated keyword list.
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<String>;
}

// Too generic to discriminate between restaurants
const GENERIC_WORDS: &[&str] = &[
    "food",
    "cuisine",
    "dinner",
    "restaurant",
    "restaurants",
    "eat",
    "like",
    "want",
    "suggestion",
    "suggestions",
    "recommend",
    "near",
    "place",
];

/// Word-level extractor: drops stop words, generic dining words and
/// numbers, then de-duplicates keeping first occurrence.
#[derive(Debug, Clone)]
pub struct SimpleKeywordExtractor {
    ignored: AHashSet<String>,
}

impl Default for SimpleKeywordExtractor {
    fn default() -> Self {
        Self {
            ignored: GENERIC_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl SimpleKeywordExtractor {
    #[must_use]
    pub fn with_ignored<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored
            .extend(words.into_iter().map(|w| w.into().to_lowercase()));
        self
    }
}

impl KeywordExtractor for SimpleKeywordExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = AHashSet::new();
        text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .map(|w| w.trim_matches('\'').to_lowercase())
            .filter(|w| w.chars().count() > 1)
            .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
            .filter(|w| !w.contains('\''))
            .filter(|w| !is_stop_word(w) && !self.ignored.contains(w))
            .filter(|w| seen.insert(w.clone()))
            .collect()
    }
}
