//! Text vectorization strategies.
//!
//! [`TextVectorizer`] is chosen once at build time; every caller goes through
//! `fit_transform`/`transform` and never inspects the variant.

use crate::embedder::{resolve_builtin, Embedder};
use crate::tfidf::TfIdfVectorizer;
use crate::{Error, Result, Vector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stateless wrapper around a pretrained [`Embedder`].
#[derive(Clone)]
pub struct DenseEncoder {
    embedder: Arc<dyn Embedder>,
}

impl fmt::Debug for DenseEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseEncoder")
            .field("model", &self.embedder.id())
            .field("dim", &self.embedder.dimension())
            .finish()
    }
}

impl DenseEncoder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn model_id(&self) -> &str {
        self.embedder.id()
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    fn check(&self, raw: Vec<f32>) -> Result<Vector> {
        if raw.len() != self.dimension() {
            return Err(Error::Embedding(format!(
                "model {} returned {} values, expected {}",
                self.model_id(),
                raw.len(),
                self.dimension()
            )));
        }
        if raw.iter().any(|x| !x.is_finite()) {
            return Err(Error::Embedding(format!(
                "model {} returned a non-finite value",
                self.model_id()
            )));
        }
        Ok(Vector::new(raw))
    }

    pub fn transform(&self, text: &str) -> Result<Vector> {
        self.check(self.embedder.embed(text)?)
    }

    pub fn transform_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Vector>> {
        let refs: Vec<&str> = texts.iter().map(AsRef::as_ref).collect();
        self.embedder
            .embed_batch(&refs)?
            .into_iter()
            .map(|raw| self.check(raw))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum TextVectorizer {
    SparseTfIdf(TfIdfVectorizer),
    DenseEmbedding(DenseEncoder),
}

impl TextVectorizer {
    pub fn tfidf(max_features: Option<usize>) -> Self {
        Self::SparseTfIdf(TfIdfVectorizer::new(max_features))
    }

    pub fn dense(embedder: Arc<dyn Embedder>) -> Self {
        Self::DenseEmbedding(DenseEncoder::new(embedder))
    }

    /// N×D_text rows for the corpus. Only the sparse variant learns anything.
    pub fn fit_transform<S: AsRef<str> + Sync>(&mut self, corpus: &[S]) -> Result<Vec<Vector>> {
        if corpus.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        match self {
            Self::SparseTfIdf(tfidf) => tfidf.fit_transform(corpus),
            Self::DenseEmbedding(encoder) => encoder.transform_batch(corpus),
        }
    }

    pub fn transform(&self, text: &str) -> Result<Vector> {
        match self {
            Self::SparseTfIdf(tfidf) => tfidf.transform(text),
            Self::DenseEmbedding(encoder) => encoder.transform(text),
        }
    }

    /// D_text; 0 for an unfitted TF-IDF vectorizer
    pub fn dimension(&self) -> usize {
        match self {
            Self::SparseTfIdf(tfidf) => tfidf.dimension(),
            Self::DenseEmbedding(encoder) => encoder.dimension(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SparseTfIdf(_) => "tfidf",
            Self::DenseEmbedding(_) => "dense",
        }
    }

    pub fn state(&self) -> TextVectorizerStateRef<'_> {
        match self {
            Self::SparseTfIdf(tfidf) => TextVectorizerStateRef::SparseTfIdf(tfidf),
            Self::DenseEmbedding(encoder) => TextVectorizerStateRef::DenseEmbedding {
                model_id: encoder.model_id(),
                dim: encoder.dimension(),
            },
        }
    }

    /// Rebuild from persisted state, resolving dense models through `resolver`.
    pub fn from_state<F>(state: TextVectorizerState, resolver: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Result<Arc<dyn Embedder>>,
    {
        match state {
            TextVectorizerState::SparseTfIdf(tfidf) => Ok(Self::SparseTfIdf(tfidf)),
            TextVectorizerState::DenseEmbedding { model_id, dim } => {
                let embedder = resolver(&model_id)?;
                if embedder.dimension() != dim {
                    return Err(Error::InvalidDimension {
                        expected: dim,
                        actual: embedder.dimension(),
                    });
                }
                Ok(Self::dense(embedder))
            }
        }
    }

    pub fn from_state_builtin(state: TextVectorizerState) -> Result<Self> {
        Self::from_state(state, resolve_builtin)
    }
}

impl Serialize for TextVectorizer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.state().serialize(serializer)
    }
}

/// Borrowed persisted form. Dense models are stored by id only.
#[derive(Debug, Serialize)]
pub enum TextVectorizerStateRef<'a> {
    SparseTfIdf(&'a TfIdfVectorizer),
    DenseEmbedding { model_id: &'a str, dim: usize },
}

/// Owned persisted form; same layout as [`TextVectorizerStateRef`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum TextVectorizerState {
    SparseTfIdf(TfIdfVectorizer),
    DenseEmbedding { model_id: String, dim: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;

    #[derive(Debug)]
    struct BrokenEmbedder;

    impl Embedder for BrokenEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }
        fn dimension(&self) -> usize {
            4
        }
        fn id(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_sparse_fit_transform() {
        let mut v = TextVectorizer::tfidf(None);
        let rows = v.fit_transform(&["italian pizza", "thai curri"]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(v.dimension(), 4);
        assert_eq!(v.transform("pizza").unwrap().dim(), 4);
    }

    #[test]
    fn test_dense_is_stateless() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(32).unwrap());
        let mut v = TextVectorizer::dense(embedder);
        let rows = v.fit_transform(&["italian pizza", "thai curri"]).unwrap();
        assert_eq!(rows[0], v.transform("italian pizza").unwrap());
        assert_eq!(v.dimension(), 32);
    }

    #[test]
    fn test_dense_rejects_wrong_width() {
        let v = TextVectorizer::dense(Arc::new(BrokenEmbedder));
        assert!(matches!(v.transform("x"), Err(Error::Embedding(_))));
    }

    #[test]
    fn test_empty_corpus() {
        let mut v = TextVectorizer::dense(Arc::new(HashEmbedder::default()));
        let empty: [&str; 0] = [];
        assert!(matches!(v.fit_transform(&empty), Err(Error::EmptyCorpus)));
    }

    #[test]
    fn test_state_round_trip_through_json() {
        let mut v = TextVectorizer::tfidf(Some(10));
        v.fit_transform(&["sushi ramen", "pizza"]).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        let state: TextVectorizerState = serde_json::from_str(&json).unwrap();
        let restored = TextVectorizer::from_state_builtin(state).unwrap();
        assert_eq!(
            restored.transform("ramen").unwrap(),
            v.transform("ramen").unwrap()
        );

        let dense = TextVectorizer::dense(Arc::new(HashEmbedder::new(8).unwrap()));
        let json = serde_json::to_string(&dense).unwrap();
        let state: TextVectorizerState = serde_json::from_str(&json).unwrap();
        assert_eq!(
            state,
            TextVectorizerState::DenseEmbedding {
                model_id: "hash-8".into(),
                dim: 8
            }
        );
    }

    #[test]
    fn test_from_state_dimension_mismatch() {
        let state = TextVectorizerState::DenseEmbedding {
            model_id: "hash-8".into(),
            dim: 16,
        };
        assert!(matches!(
            TextVectorizer::from_state_builtin(state),
            Err(Error::InvalidDimension { expected: 16, actual: 8 })
        ));
    }
}
