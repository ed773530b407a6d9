// Keyword list -> text-space query vector
use crate::tags::TagBuilder;
use crate::text::TextVectorizer;
use crate::{Result, Vector};

/// Maps extracted keywords into the fitted text space.
///
/// Keywords are stemmed with the tag builder that produced the corpus tags,
/// so `"restaurants"` on the query side meets `"restaur"` in the vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct QueryVectorizer<'a> {
    tags: &'a TagBuilder,
    text: &'a TextVectorizer,
}

impl<'a> QueryVectorizer<'a> {
    pub fn new(tags: &'a TagBuilder, text: &'a TextVectorizer) -> Self {
        Self { tags, text }
    }

    /// Stemmed, space-joined query text
    pub fn query_text<S: AsRef<str>>(&self, keywords: &[S]) -> String {
        let joined = keywords
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");
        self.tags.stem_text(&joined)
    }

    /// `None` when there is nothing to search for: no keywords, or keywords
    /// that stem to nothing.
    pub fn vectorize<S: AsRef<str>>(&self, keywords: &[S]) -> Result<Option<Vector>> {
        let text = self.query_text(keywords);
        if text.is_empty() {
            return Ok(None);
        }
        self.text.transform(&text).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> (TagBuilder, TextVectorizer) {
        let tags = TagBuilder::default();
        let corpus: Vec<String> = ["Italian Pizza restaurants", "Thai noodles"]
            .iter()
            .map(|t| tags.stem_text(t))
            .collect();
        let mut text = TextVectorizer::tfidf(None);
        text.fit_transform(&corpus).unwrap();
        (tags, text)
    }

    #[test]
    fn test_empty_keywords() {
        let (tags, text) = fitted();
        let q = QueryVectorizer::new(&tags, &text);
        let none: [&str; 0] = [];
        assert!(q.vectorize(&none).unwrap().is_none());
        assert!(q.vectorize(&["  "]).unwrap().is_none());
    }

    #[test]
    fn test_keywords_are_stemmed_like_tags() {
        let (tags, text) = fitted();
        let q = QueryVectorizer::new(&tags, &text);
        assert_eq!(q.query_text(&["Restaurants", "Noodles"]), "restaur noodl");
        let v = q.vectorize(&["Restaurants"]).unwrap().unwrap();
        assert_eq!(v.dim(), text.dimension());
        assert!(v.norm() > 0.99);
    }
}
