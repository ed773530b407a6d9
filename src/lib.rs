//! # tastematch
//!
//! Content-based item recommendation over a small, static catalogue.
//!
//! Each item is described by a bag of stemmed tags (categories, location and
//! review text) and four numeric attributes (price tier, rating, review count,
//! rank). Tags become TF-IDF or dense embedding vectors, numerics are
//! z-scored, and the two are concatenated into one vector per item. All
//! pairwise cosine similarities are computed up front, so queries are lookups
//! plus a top-K selection.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! tastematch --items items.csv --reviews reviews.csv build
//! tastematch --items items.csv similar --name "Luigi's" -k 5
//! tastematch --items items.csv search pizza brooklyn
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use tastematch::prelude::*;
//!
//! let raw = |id: &str, categories: &str| RawItem {
//!     id: id.into(),
//!     name: id.into(),
//!     categories: categories.into(),
//!     location: "Midtown".into(),
//!     price: "$".into(),
//!     rating: "4.0".into(),
//!     review_count: "10".into(),
//!     rank: "1".into(),
//! };
//! let items = vec![raw("a", "Pizza"), raw("b", "Thai"), raw("c", "Pizza")];
//!
//! let snapshot = SnapshotBuilder::new(BuildConfig::default())?.build(items, &[])?;
//! let recommender = Recommender::new(std::sync::Arc::new(SnapshotHandle::with_snapshot(snapshot)));
//!
//! let response = recommender.lookup_by_keywords(&["pizza"])?;
//! assert_eq!(response.status, LookupStatus::Found);
//! # Ok::<(), tastematch::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! - `tastematch-core` - text and numeric features, the similarity index, evaluation
//! - `tastematch-recommend` - build pipeline, snapshots, the serving facade
//! - `tastematch-storage` - table loading and snapshot files

// Re-export core types
pub use tastematch_core::{
    Embedder, Error, EvaluationHarness, HashEmbedder, Item, Neighbor, NumericNormalizer,
    NumericPolicy, RankingMetrics, RawItem, Relevance, Result, Review, SimilarityIndex,
    TagBuilder, TextVectorizer, TfIdfVectorizer, Vector,
};

// Re-export the build and serving layer
pub use tastematch_recommend::{
    BuildConfig, KeywordExtractor, LookupStatus, RecommendationResponse, RecommendedItem,
    Recommender, SceneTable, SimpleKeywordExtractor, Snapshot, SnapshotBuilder, SnapshotHandle,
    VectorizerConfig,
};

// Re-export storage
pub use tastematch_storage::{SnapshotDescription, SnapshotManager};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BuildConfig, Error, Item, KeywordExtractor, LookupStatus, Neighbor, RawItem,
        RecommendationResponse, Recommender, Relevance, Result, Review, SimilarityIndex,
        SimpleKeywordExtractor, Snapshot, SnapshotBuilder, SnapshotHandle, SnapshotManager,
        VectorizerConfig,
    };
}

/// Table loaders
pub mod tables {
    pub use tastematch_storage::tables::{
        load_items, load_reviews, load_scene_table, load_table, Table,
    };
}
