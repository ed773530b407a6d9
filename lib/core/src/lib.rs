//! # tastematch core
//!
//! Feature fusion and similarity retrieval for item recommendation.
//!
//! - [`TagBuilder`] - stemmed text blob per item from categories, location and reviews
//! - [`TextVectorizer`] - sparse TF-IDF or dense embedding, picked at build time
//! - [`NumericNormalizer`] - z-scored price tier, rating, review count and rank
//! - [`fusion`] - text vector followed by numeric vector
//! - [`SimilarityIndex`] - N×N cosine matrix with by-id and by-vector top-K
//! - [`QueryVectorizer`] - keyword lists into the text space
//! - [`EvaluationHarness`] - HitRate, Precision, Recall, F1 and NDCG at K
//!
//! ## Example
//!
//! ```rust
//! use tastematch_core::{fusion, NumericNormalizer, SimilarityIndex, TagBuilder, TextVectorizer};
//!
//! let tags = TagBuilder::default();
//! let corpus = vec![
//!     tags.build(&["Italian", "Pizza"], "Midtown", "great crust"),
//!     tags.build(&["Thai"], "Chelsea", "spicy noodles"),
//!     tags.build(&["Italian", "Pizza"], "Midtown", "great crust"),
//! ];
//!
//! let mut text = TextVectorizer::tfidf(Some(5000));
//! let text_rows = text.fit_transform(&corpus).unwrap();
//! let (_, numeric_rows) = NumericNormalizer::fit_transform(&[
//!     [1.0, 4.5, 100.0, 1.0],
//!     [2.0, 4.0, 50.0, 2.0],
//!     [1.0, 4.5, 100.0, 1.0],
//! ])
//! .unwrap();
//! let fused = fusion::fuse_all(&text_rows, &numeric_rows, text.dimension()).unwrap();
//!
//! let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
//! let index = SimilarityIndex::build(ids, fused, text.dimension()).unwrap();
//! let top = index.query_by_id("a", 1).unwrap();
//! assert_eq!(index.id(top[0].index), Some("c"));
//! ```

pub mod embedder;
pub mod error;
pub mod eval;
pub mod fusion;
pub mod index;
pub mod item;
#[cfg(feature = "fastembed")]
pub mod minilm;
pub mod numeric;
pub mod query;
pub mod stem;
pub mod stopwords;
pub mod tags;
pub mod text;
pub mod tfidf;
pub mod vector;

/// Fixed-order dense kernels (dot, norm, cosine)
pub mod simd;

pub use embedder::{Embedder, HashEmbedder};
#[cfg(feature = "fastembed")]
pub use minilm::FastEmbedEmbedder;
pub use error::{Error, Result};
pub use eval::{EvaluationHarness, RankingMetrics, Relevance};
pub use index::{Neighbor, SimilarityIndex};
pub use item::{Item, NumericPolicy, RawItem, Record, Review};
pub use numeric::NumericNormalizer;
pub use query::QueryVectorizer;
pub use stem::{PorterStemmer, Stemmer};
pub use tags::TagBuilder;
pub use text::{TextVectorizer, TextVectorizerState};
pub use tfidf::TfIdfVectorizer;
pub use vector::Vector;
