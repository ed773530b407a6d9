//! # tastematch recommend
//!
//! Turns raw item and review tables into an immutable [`Snapshot`] and serves
//! recommendations from it.
//!
//! - [`BuildConfig`] - vectorizer choice, numeric policy, review language
//! - [`SnapshotBuilder`] - the offline build pipeline
//! - [`SnapshotHandle`] - atomic publish of rebuilt snapshots
//! - [`Recommender`] - lookups by name, id, keywords or free text
//! - [`SceneTable`] - post-retrieval scene labels

pub mod config;
pub mod keywords;
pub mod pipeline;
pub mod response;
pub mod scenes;
pub mod service;
pub mod snapshot;

pub use config::{BuildConfig, VectorizerConfig};
pub use keywords::{KeywordExtractor, SimpleKeywordExtractor};
pub use pipeline::SnapshotBuilder;
pub use response::{LookupStatus, RecommendationResponse, RecommendedItem};
pub use scenes::SceneTable;
pub use service::{Recommender, SnapshotHandle};
pub use snapshot::{Snapshot, SnapshotData, SnapshotMeta, SNAPSHOT_FORMAT_VERSION};
