// TF-IDF vectorizer over stemmed tag text
use crate::stopwords::is_stop_word;
use crate::{Error, Result, Vector};
use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// Fitted term vocabulary with smoothed inverse document frequencies.
///
/// Columns are ordered alphabetically by term. When the corpus has more
/// distinct terms than `max_features`, the most frequent terms (by total
/// count across the corpus) are kept; equal counts favour the
/// alphabetically smaller term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    max_features: Option<usize>,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f32>,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new(Some(DEFAULT_MAX_FEATURES))
    }
}

impl TfIdfVectorizer {
    #[inline]
    #[must_use]
    pub fn new(max_features: Option<usize>) -> Self {
        Self {
            max_features,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
        }
    }

    /// Lowercased runs of two or more word characters, stop words removed
    #[inline]
    pub fn tokenize(text: &str) -> Vec<String> {
        text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|s| s.chars().count() > 1)
            .map(str::to_lowercase)
            .filter(|s| !is_stop_word(s))
            .collect()
    }

    pub fn fit<S: AsRef<str> + Sync>(&mut self, corpus: &[S]) -> Result<()> {
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let docs: Vec<Vec<String>> = corpus
            .par_iter()
            .map(|doc| Self::tokenize(doc.as_ref()))
            .collect();

        // term -> (total count, document frequency)
        let mut stats: AHashMap<&str, (u64, u64)> = AHashMap::new();
        for tokens in &docs {
            let mut seen: AHashSet<&str> = AHashSet::new();
            for token in tokens {
                let entry = stats.entry(token.as_str()).or_insert((0, 0));
                entry.0 += 1;
                if seen.insert(token.as_str()) {
                    entry.1 += 1;
                }
            }
        }
        if stats.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let mut terms: Vec<(&str, u64, u64)> = stats
            .into_iter()
            .map(|(term, (count, df))| (term, count, df))
            .collect();
        if let Some(limit) = self.max_features {
            if terms.len() > limit {
                terms.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
                terms.truncate(limit);
            }
        }
        terms.sort_unstable_by(|a, b| a.0.cmp(b.0));
        if terms.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let n = docs.len() as f64;
        self.vocabulary = terms
            .iter()
            .enumerate()
            .map(|(col, (term, _, _))| (term.to_string(), col))
            .collect();
        self.idf = terms
            .iter()
            .map(|(_, _, df)| (((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0) as f32)
            .collect();
        Ok(())
    }

    /// Project text into the fitted space; unseen terms are ignored.
    /// Rows are L2-normalized, so text with no known terms maps to zeros.
    pub fn transform(&self, text: &str) -> Result<Vector> {
        if !self.is_fitted() {
            return Err(Error::NotFitted);
        }

        let mut counts: AHashMap<usize, u32> = AHashMap::new();
        for token in Self::tokenize(text) {
            if let Some(&col) = self.vocabulary.get(&token) {
                *counts.entry(col).or_insert(0) += 1;
            }
        }

        let mut weights = vec![0.0f64; self.idf.len()];
        for (col, tf) in counts {
            weights[col] = tf as f64 * self.idf[col] as f64;
        }
        let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for w in &mut weights {
                *w /= norm;
            }
        }
        Ok(Vector::new(weights.into_iter().map(|w| w as f32).collect()))
    }

    pub fn fit_transform<S: AsRef<str> + Sync>(&mut self, corpus: &[S]) -> Result<Vec<Vector>> {
        self.fit(corpus)?;
        let fitted = &*self;
        corpus
            .par_iter()
            .map(|doc| fitted.transform(doc.as_ref()))
            .collect()
    }

    #[inline]
    pub fn is_fitted(&self) -> bool {
        !self.idf.is_empty()
    }

    /// D_text
    #[inline]
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    #[inline]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        let tokens = TfIdfVectorizer::tokenize("The Pizza, a b-side_x and PASTA!");
        assert_eq!(tokens, vec!["pizza", "side_x", "pasta"]);
    }

    #[test]
    fn test_vocabulary_is_alphabetical() {
        let mut v = TfIdfVectorizer::new(None);
        v.fit(&["sushi ramen", "pizza sushi"]).unwrap();
        let cols: Vec<(&str, usize)> = v
            .vocabulary()
            .iter()
            .map(|(t, c)| (t.as_str(), *c))
            .collect();
        assert_eq!(cols, vec![("pizza", 0), ("ramen", 1), ("sushi", 2)]);
    }

    #[test]
    fn test_smoothed_idf() {
        let mut v = TfIdfVectorizer::new(None);
        v.fit(&["sushi ramen", "pizza sushi"]).unwrap();
        // sushi in both docs -> ln(3/3) + 1
        assert!((v.idf()[2] - 1.0).abs() < 1e-6);
        // pizza in one doc -> ln(3/2) + 1
        assert!((v.idf()[0] - (1.5f32.ln() + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let mut v = TfIdfVectorizer::new(Some(2));
        v.fit(&["taco taco burrito", "taco nacho burrito", "salsa"])
            .unwrap();
        let terms: Vec<&str> = v.vocabulary().keys().map(String::as_str).collect();
        assert_eq!(terms, vec!["burrito", "taco"]);
    }

    #[test]
    fn test_max_features_tie_prefers_smaller_term() {
        let mut v = TfIdfVectorizer::new(Some(1));
        v.fit(&["zeta alpha"]).unwrap();
        assert!(v.vocabulary().contains_key("alpha"));
    }

    #[test]
    fn test_transform_is_unit_length() {
        let mut v = TfIdfVectorizer::new(None);
        let rows = v.fit_transform(&["sushi ramen ramen", "pizza sushi"]).unwrap();
        for row in &rows {
            assert_eq!(row.dim(), 3);
            assert!((row.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_transform_unseen_text_is_zero() {
        let mut v = TfIdfVectorizer::new(None);
        v.fit(&["sushi ramen"]).unwrap();
        let out = v.transform("tacos burritos").unwrap();
        assert!(out.as_slice().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_errors() {
        let mut v = TfIdfVectorizer::new(None);
        assert!(matches!(v.transform("x"), Err(Error::NotFitted)));
        let empty: [&str; 0] = [];
        assert!(matches!(v.fit(&empty), Err(Error::EmptyCorpus)));
        assert!(matches!(v.fit(&["the and a"]), Err(Error::EmptyVocabulary)));
    }
}
