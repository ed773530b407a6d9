//! Offline build: raw tables in, one immutable [`Snapshot`] out.
//!
//! Any failure aborts the whole build; nothing partial is ever returned.

use crate::config::BuildConfig;
use crate::snapshot::{Snapshot, SnapshotMeta, SNAPSHOT_FORMAT_VERSION};
use ahash::AHashSet;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tastematch_core::embedder::Embedder;
use tastematch_core::item::{validate_item_columns, validate_review_columns};
use tastematch_core::{
    fusion, Error, Item, NumericNormalizer, RawItem, Record, Result, Review, SimilarityIndex,
    TagBuilder,
};
use tracing::{debug, info};

pub struct SnapshotBuilder {
    config: BuildConfig,
    embedder: Option<Arc<dyn Embedder>>,
}

impl SnapshotBuilder {
    pub fn new(config: BuildConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            embedder: None,
        })
    }

    /// Use a custom dense model instead of the built-in lookup.
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build from string records, validating table headers first.
    pub fn build_from_records(
        &self,
        item_headers: &[String],
        items: &[Record],
        review_headers: &[String],
        reviews: &[Record],
    ) -> Result<Snapshot> {
        validate_item_columns(item_headers)?;
        validate_review_columns(review_headers)?;
        let raw = items
            .iter()
            .map(RawItem::from_record)
            .collect::<Result<Vec<_>>>()?;
        let reviews = reviews
            .iter()
            .map(Review::from_record)
            .collect::<Result<Vec<_>>>()?;
        self.build(raw, &reviews)
    }

    pub fn build(&self, raw: Vec<RawItem>, reviews: &[Review]) -> Result<Snapshot> {
        let started = Instant::now();
        if raw.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        info!("Building snapshot from {} items, {} reviews", raw.len(), reviews.len());

        let mut items = self.parse_items(raw)?;

        let tags = TagBuilder::new(self.config.review_language.clone());
        let by_item = tags.aggregate_reviews(reviews);
        for item in &mut items {
            let review_text = by_item.get(&item.id).map(String::as_str).unwrap_or("");
            item.tags = tags.build(&item.categories, &item.location, review_text);
        }
        debug!(
            "Tagged {} items ({} with {} reviews)",
            items.len(),
            by_item.len(),
            self.config.review_language
        );

        let mut vectorizer = self.config.text_vectorizer(self.embedder.clone())?;
        let corpus: Vec<&str> = items.iter().map(|i| i.tags.as_str()).collect();
        let text_rows = vectorizer.fit_transform(&corpus)?;
        let text_dim = vectorizer.dimension();
        info!("Text vectors: {} ({} dims)", vectorizer.kind(), text_dim);

        let numeric: Vec<_> = items.iter().map(Item::numeric_features).collect();
        let (normalizer, numeric_rows) = NumericNormalizer::fit_transform(&numeric)?;
        debug!(
            "Numeric means {:?}, scales {:?}",
            normalizer.mean(),
            normalizer.scale()
        );

        let fused = fusion::fuse_all(&text_rows, &numeric_rows, text_dim)?;
        let ids = items.iter().map(|i| i.id.clone()).collect();

        let matrix_started = Instant::now();
        let index = SimilarityIndex::build(ids, fused, text_dim)?;
        info!(
            "Similarity matrix {}x{} computed in {:?}",
            index.len(),
            index.len(),
            matrix_started.elapsed()
        );

        let meta = SnapshotMeta {
            version: SNAPSHOT_FORMAT_VERSION,
            built_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            config: self.config.clone(),
            item_count: items.len(),
            text_dim,
        };
        let snapshot = Snapshot::new(meta, items, vectorizer, normalizer, index)?;
        info!("Snapshot built in {:?}", started.elapsed());
        Ok(snapshot)
    }

    fn parse_items(&self, raw: Vec<RawItem>) -> Result<Vec<Item>> {
        let mut seen = AHashSet::with_capacity(raw.len());
        let mut items = Vec::with_capacity(raw.len());
        for raw_item in raw {
            if raw_item.id.is_empty() {
                return Err(Error::missing_field(tastematch_core::item::ITEM_TABLE, "id"));
            }
            if !seen.insert(raw_item.id.clone()) {
                return Err(Error::DuplicateItem(raw_item.id));
            }
            items.push(raw_item.parse(self.config.numeric_policy, &self.config.price_symbols)?);
        }
        Ok(items)
    }
}
