//! Tag text assembly.
//!
//! An item's tags are its categories, location and English review text,
//! lowercased and stemmed token by token. The same [`TagBuilder`] stems query
//! keywords so both sides land in one vocabulary.

use crate::item::Review;
use crate::stem::{PorterStemmer, Stemmer};
use ahash::AHashMap;
use std::sync::Arc;

pub const DEFAULT_REVIEW_LANGUAGE: &str = "en";

#[derive(Debug, Clone)]
pub struct TagBuilder {
    language: String,
    stemmer: Arc<dyn Stemmer>,
}

impl Default for TagBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_REVIEW_LANGUAGE)
    }
}

impl TagBuilder {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            stemmer: Arc::new(PorterStemmer),
        }
    }

    #[must_use]
    pub fn with_stemmer(mut self, stemmer: Arc<dyn Stemmer>) -> Self {
        self.stemmer = stemmer;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Concatenate review text per business id, keeping only reviews in the
    /// configured language. Reviews keep their input order.
    pub fn aggregate_reviews<'a, I>(&self, reviews: I) -> AHashMap<String, String>
    where
        I: IntoIterator<Item = &'a Review>,
    {
        let mut by_item: AHashMap<String, String> = AHashMap::new();
        for review in reviews {
            if !review.language.eq_ignore_ascii_case(&self.language) {
                continue;
            }
            let text = review.text.trim();
            if text.is_empty() {
                continue;
            }
            let entry = by_item.entry(review.business_id.clone()).or_default();
            if !entry.is_empty() {
                entry.push(' ');
            }
            entry.push_str(text);
        }
        by_item
    }

    /// Build the tag string for one item. `reviews` may be empty.
    pub fn build<S: AsRef<str>>(&self, categories: &[S], location: &str, reviews: &str) -> String {
        let mut raw = String::new();
        for part in categories
            .iter()
            .map(AsRef::as_ref)
            .chain([location, reviews])
        {
            if !raw.is_empty() {
                raw.push(' ');
            }
            raw.push_str(part);
        }
        self.stem_text(&raw)
    }

    /// Lowercase, split on whitespace, stem each token, rejoin with single spaces.
    pub fn stem_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for token in text.split_whitespace() {
            let stemmed = self.stemmer.stem(token);
            if stemmed.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&stemmed);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(id: &str, lang: &str, text: &str) -> Review {
        Review {
            business_id: id.into(),
            language: lang.into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_filters_non_english_reviews() {
        let builder = TagBuilder::default();
        let reviews = vec![
            review("a", "en", "Great pizza"),
            review("a", "fr", "Très bon"),
            review("a", "en", "Friendly staff"),
            review("b", "de", "Sehr gut"),
        ];
        let agg = builder.aggregate_reviews(&reviews);
        assert_eq!(agg.get("a").map(String::as_str), Some("Great pizza Friendly staff"));
        assert!(!agg.contains_key("b"));
    }

    #[test]
    fn test_build_without_reviews() {
        let builder = TagBuilder::default();
        let tags = builder.build(&["Italian", "Pizza"], "Midtown", "");
        assert_eq!(tags, "italian pizza midtown");
    }

    #[test]
    fn test_build_stems_and_collapses_whitespace() {
        let builder = TagBuilder::default();
        let tags = builder.build(&["Wine  Bars"], " West Village ", "Amazing   cocktails");
        assert_eq!(tags, "wine bar west villag amaz cocktail");
    }

    #[derive(Debug)]
    struct Lowercase;

    impl Stemmer for Lowercase {
        fn stem(&self, word: &str) -> String {
            word.to_lowercase()
        }
    }

    #[test]
    fn test_custom_stemmer() {
        let builder = TagBuilder::default().with_stemmer(Arc::new(Lowercase));
        let tags = builder.build(&["Wine Bars"], "West Village", "Amazing cocktails");
        assert_eq!(tags, "wine bars west village amazing cocktails");
    }

    #[test]
    fn test_deterministic() {
        let builder = TagBuilder::default();
        let a = builder.build(&["Sushi Bars"], "Soho", "fresh fish and friendly chefs");
        let b = builder.build(&["Sushi Bars"], "Soho", "fresh fish and friendly chefs");
        assert_eq!(a, b);
    }
}
