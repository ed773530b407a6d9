//! The immutable build artifact served to queries.
//!
//! A [`Snapshot`] owns everything a query needs: item metadata, the fitted
//! text vectorizer, normalizer statistics, fused vectors and the similarity
//! matrix. It is never mutated after construction; a rebuild produces a new
//! value.

use crate::config::BuildConfig;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tastematch_core::embedder::{resolve_builtin, Embedder};
use tastematch_core::text::TextVectorizerState;
use tastematch_core::{
    Error, EvaluationHarness, Item, Neighbor, NumericNormalizer, QueryVectorizer, RankingMetrics,
    Relevance, Result, SimilarityIndex, TagBuilder, TextVectorizer,
};

/// Bumped whenever the persisted layout changes.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub version: u32,
    /// Unix seconds
    pub built_at: u64,
    #[serde(with = "config_as_json")]
    pub config: BuildConfig,
    pub item_count: usize,
    pub text_dim: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    meta: SnapshotMeta,
    items: Vec<Item>,
    vectorizer: TextVectorizer,
    normalizer: NumericNormalizer,
    index: SimilarityIndex,
    #[serde(skip)]
    tags: TagBuilder,
    /// Lowercased name -> first corpus position
    #[serde(skip)]
    names: AHashMap<String, usize>,
}

/// Owned persisted layout of [`Snapshot`].
#[derive(Debug, Deserialize)]
pub struct SnapshotData {
    pub meta: SnapshotMeta,
    pub items: Vec<Item>,
    pub vectorizer: TextVectorizerState,
    pub normalizer: NumericNormalizer,
    pub index: SimilarityIndex,
}

// The config uses internally tagged enums, which non-self-describing formats
// cannot read back; it travels as a JSON string inside the snapshot.
mod config_as_json {
    use crate::config::BuildConfig;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(config: &BuildConfig, s: S) -> Result<S::Ok, S::Error> {
        let json = serde_json::to_string(config).map_err(serde::ser::Error::custom)?;
        s.serialize_str(&json)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BuildConfig, D::Error> {
        let json = String::deserialize(d)?;
        serde_json::from_str(&json).map_err(serde::de::Error::custom)
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Snapshot {
    pub(crate) fn new(
        meta: SnapshotMeta,
        items: Vec<Item>,
        vectorizer: TextVectorizer,
        normalizer: NumericNormalizer,
        index: SimilarityIndex,
    ) -> Result<Self> {
        if items.len() != index.len() {
            return Err(Error::InvalidDimension {
                expected: index.len(),
                actual: items.len(),
            });
        }
        if let Some((pos, item)) = items
            .iter()
            .enumerate()
            .find(|(i, item)| index.id(*i) != Some(item.id.as_str()))
        {
            return Err(Error::Serialization(format!(
                "item {} does not match index position {pos}",
                item.id
            )));
        }
        if vectorizer.dimension() != index.text_dim() {
            return Err(Error::InvalidDimension {
                expected: index.text_dim(),
                actual: vectorizer.dimension(),
            });
        }

        let mut names = AHashMap::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            names.entry(name_key(&item.name)).or_insert(i);
        }
        let tags = TagBuilder::new(meta.config.review_language.clone());

        Ok(Self {
            meta,
            items,
            vectorizer,
            normalizer,
            index,
            tags,
            names,
        })
    }

    /// Restore a persisted snapshot, resolving dense models through `resolver`.
    pub fn from_data<F>(data: SnapshotData, resolver: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Result<Arc<dyn Embedder>>,
    {
        if data.meta.version != SNAPSHOT_FORMAT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_FORMAT_VERSION})",
                data.meta.version
            )));
        }
        let vectorizer = TextVectorizer::from_state(data.vectorizer, resolver)?;
        Self::new(data.meta, data.items, vectorizer, data.normalizer, data.index)
    }

    pub fn from_data_builtin(data: SnapshotData) -> Result<Self> {
        Self::from_data(data, resolve_builtin)
    }

    pub fn meta(&self) -> &SnapshotMeta {
        &self.meta
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn vectorizer(&self) -> &TextVectorizer {
        &self.vectorizer
    }

    pub fn normalizer(&self) -> &NumericNormalizer {
        &self.normalizer
    }

    pub fn tag_builder(&self) -> &TagBuilder {
        &self.tags
    }

    /// Case-insensitive exact name match; the first item wins on duplicates.
    pub fn position_by_name(&self, name: &str) -> Option<usize> {
        self.names.get(&name_key(name)).copied()
    }

    pub fn query_vectorizer(&self) -> QueryVectorizer<'_> {
        QueryVectorizer::new(&self.tags, &self.vectorizer)
    }

    pub fn similar_to_id(&self, id: &str, k: usize) -> Result<Vec<Neighbor>> {
        self.index.query_by_id(id, k)
    }

    /// Text-space search; empty keywords give an empty result.
    pub fn search_keywords<S: AsRef<str>>(&self, keywords: &[S], k: usize) -> Result<Vec<Neighbor>> {
        match self.query_vectorizer().vectorize(keywords)? {
            Some(query) => self.index.query_by_vector(query.as_slice(), k),
            None => Ok(Vec::new()),
        }
    }

    pub fn evaluate_at(&self, relevance: Relevance, ks: &[usize]) -> Result<Vec<RankingMetrics>> {
        EvaluationHarness::new(&self.index, &self.items)?.evaluate_at(relevance, ks)
    }
}
