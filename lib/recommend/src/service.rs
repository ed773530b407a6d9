//! Serving facade over a published snapshot.

use crate::keywords::KeywordExtractor;
use crate::response::{RecommendationResponse, RecommendedItem};
use crate::scenes::SceneTable;
use crate::snapshot::Snapshot;
use parking_lot::RwLock;
use std::sync::Arc;
use tastematch_core::index::DEFAULT_K;
use tastematch_core::{Error, Neighbor, Result};
use tracing::{debug, info};

/// Holds the currently served snapshot.
///
/// Readers clone the `Arc` and work on it without holding the lock, so a
/// concurrent [`SnapshotHandle::publish`] never exposes a half-built state:
/// a request sees either the old snapshot or the new one.
#[derive(Debug, Default)]
pub struct SnapshotHandle {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(snapshot))),
        }
    }

    /// Swap in a fully built snapshot; returns the one it replaced.
    pub fn publish(&self, snapshot: Snapshot) -> Option<Arc<Snapshot>> {
        let snapshot = Arc::new(snapshot);
        info!(
            "Publishing snapshot: {} items, built_at={}",
            snapshot.len(),
            snapshot.meta().built_at
        );
        self.current.write().replace(snapshot)
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.current.read().is_some()
    }
}

pub struct Recommender {
    handle: Arc<SnapshotHandle>,
    scenes: Arc<SceneTable>,
    k: usize,
}

impl Recommender {
    pub fn new(handle: Arc<SnapshotHandle>) -> Self {
        Self {
            handle,
            scenes: Arc::new(SceneTable::default()),
            k: DEFAULT_K,
        }
    }

    #[must_use]
    pub fn with_scenes(mut self, scenes: SceneTable) -> Self {
        self.scenes = Arc::new(scenes);
        self
    }

    /// Results per query
    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn handle(&self) -> &Arc<SnapshotHandle> {
        &self.handle
    }

    fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.handle.current().ok_or(Error::NotFitted)
    }

    /// All item names in corpus order.
    pub fn item_names(&self) -> Result<Vec<String>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.items().iter().map(|i| i.name.clone()).collect())
    }

    /// Items most similar to the named item. An unknown name is a normal
    /// `not_found` response.
    pub fn lookup_by_name(&self, name: &str) -> Result<RecommendationResponse> {
        let snapshot = self.snapshot()?;
        let Some(position) = snapshot.position_by_name(name) else {
            debug!("Unknown item name {:?}", name);
            return Ok(RecommendationResponse::not_found(name));
        };
        let neighbors = snapshot.index().query_by_index(position, self.k)?;
        Ok(RecommendationResponse::found(
            name,
            self.materialize(&snapshot, &neighbors),
        ))
    }

    /// Same as [`Recommender::lookup_by_name`], keyed by item id.
    pub fn lookup_by_id(&self, id: &str) -> Result<RecommendationResponse> {
        let snapshot = self.snapshot()?;
        match snapshot.similar_to_id(id, self.k) {
            Ok(neighbors) => Ok(RecommendationResponse::found(
                id,
                self.materialize(&snapshot, &neighbors),
            )),
            Err(e) if e.is_recoverable() => {
                debug!("Lookup of {:?} failed: {}", id, e);
                Ok(RecommendationResponse::not_found(id))
            }
            Err(e) => Err(e),
        }
    }

    /// Text-space search over stemmed keywords. An empty list is an
    /// `empty_query` response with no results.
    pub fn lookup_by_keywords<S: AsRef<str>>(&self, keywords: &[S]) -> Result<RecommendationResponse> {
        let query = keywords
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");
        let snapshot = self.snapshot()?;
        let Some(vector) = snapshot.query_vectorizer().vectorize(keywords)? else {
            return Ok(RecommendationResponse::empty_query(query));
        };
        let neighbors = snapshot.index().query_by_vector(vector.as_slice(), self.k)?;
        Ok(RecommendationResponse::found(
            query,
            self.materialize(&snapshot, &neighbors),
        ))
    }

    /// Extract keywords from free text, then search with them.
    pub fn recommend(
        &self,
        text: &str,
        extractor: &dyn KeywordExtractor,
    ) -> Result<RecommendationResponse> {
        let keywords = extractor.extract(text);
        debug!("Extracted keywords {:?}", keywords);
        if keywords.is_empty() {
            return Ok(RecommendationResponse::empty_query(text));
        }
        let mut response = self.lookup_by_keywords(&keywords)?;
        response.query = text.to_string();
        Ok(response.with_keywords(keywords))
    }

    /// Items listed under a scene label, with metadata, in scene-table order.
    /// Names missing from the snapshot are skipped.
    pub fn scene_items(&self, scene: &str) -> Result<Vec<RecommendedItem>> {
        let snapshot = self.snapshot()?;
        let Some(names) = self.scenes.names(scene) else {
            return Ok(Vec::new());
        };
        Ok(names
            .iter()
            .filter_map(|name| snapshot.position_by_name(name))
            .map(|position| self.item_at(&snapshot, position, 1.0))
            .collect())
    }

    fn materialize(&self, snapshot: &Snapshot, neighbors: &[Neighbor]) -> Vec<RecommendedItem> {
        neighbors
            .iter()
            .map(|n| self.item_at(snapshot, n.index, n.score))
            .collect()
    }

    fn item_at(&self, snapshot: &Snapshot, position: usize, similarity: f32) -> RecommendedItem {
        let item = &snapshot.items()[position];
        RecommendedItem {
            id: item.id.clone(),
            name: item.name.clone(),
            rating: item.rating,
            price: item.price.clone(),
            review_count: item.review_count,
            similarity,
            scenes: self.scenes.scenes_for(&item.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::keywords::SimpleKeywordExtractor;
    use crate::pipeline::SnapshotBuilder;
    use crate::response::LookupStatus;
    use tastematch_core::RawItem;

    // identical numeric columns, so only the text decides the ranking
    fn raw(id: &str, name: &str, categories: &str) -> RawItem {
        RawItem {
            id: id.into(),
            name: name.into(),
            categories: categories.into(),
            location: "Soho".into(),
            price: "$".into(),
            rating: "4.0".into(),
            review_count: "10".into(),
            rank: "1".into(),
        }
    }

    fn snapshot() -> Snapshot {
        let items = vec![
            raw("a", "Luigi's", "Italian, Pizza"),
            raw("b", "Bangkok Garden", "Thai, Noodles"),
            raw("c", "Slice House", "Pizza"),
        ];
        SnapshotBuilder::new(BuildConfig::default())
            .unwrap()
            .build(items, &[])
            .unwrap()
    }

    fn recommender() -> Recommender {
        let scenes = SceneTable::from_json_str(r#"{"friend":["Slice House"],"dating":["luigi's"]}"#)
            .unwrap();
        Recommender::new(Arc::new(SnapshotHandle::with_snapshot(snapshot()))).with_scenes(scenes)
    }

    #[test]
    fn test_unpublished_handle() {
        let recommender = Recommender::new(Arc::new(SnapshotHandle::new()));
        assert!(matches!(
            recommender.lookup_by_name("x"),
            Err(Error::NotFitted)
        ));
    }

    #[test]
    fn test_lookup_by_name() {
        let response = recommender().lookup_by_name("luigi's").unwrap();
        assert_eq!(response.status, LookupStatus::Found);
        assert_eq!(response.results.len(), 2);
        assert!(response.results.iter().all(|r| r.id != "a"));
        assert_eq!(response.results[0].name, "Slice House");
        assert_eq!(response.results[0].scenes, vec!["friend"]);
    }

    #[test]
    fn test_lookup_unknown() {
        let recommender = recommender();
        assert_eq!(
            recommender.lookup_by_name("Nowhere").unwrap().status,
            LookupStatus::NotFound
        );
        assert_eq!(
            recommender.lookup_by_id("zzz").unwrap().status,
            LookupStatus::NotFound
        );
    }

    #[test]
    fn test_lookup_by_keywords() {
        let recommender = recommender();
        let empty: [&str; 0] = [];
        let response = recommender.lookup_by_keywords(&empty).unwrap();
        assert_eq!(response.status, LookupStatus::EmptyQuery);
        assert!(response.results.is_empty());

        let response = recommender.lookup_by_keywords(&["Noodles"]).unwrap();
        assert_eq!(response.results[0].id, "b");
        assert_eq!(response.results.len(), 3);

        let response = recommender.lookup_by_keywords(&["sushi"]).unwrap();
        assert_eq!(response.status, LookupStatus::NotFound);
    }

    #[test]
    fn test_recommend_from_text() {
        let recommender = recommender().with_k(1);
        let response = recommender
            .recommend("I want some thai noodles", &SimpleKeywordExtractor::default())
            .unwrap();
        assert_eq!(response.keywords, vec!["thai", "noodles"]);
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].name, "Bangkok Garden");

        let response = recommender
            .recommend("the and of", &SimpleKeywordExtractor::default())
            .unwrap();
        assert_eq!(response.status, LookupStatus::EmptyQuery);
    }

    #[test]
    fn test_publish_swaps_atomically() {
        let handle = Arc::new(SnapshotHandle::new());
        assert!(!handle.is_ready());
        assert!(handle.publish(snapshot()).is_none());
        let first = handle.current().unwrap();
        let previous = handle.publish(snapshot()).unwrap();
        assert!(Arc::ptr_eq(&first, &previous));
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_item_names_in_corpus_order() {
        assert_eq!(
            recommender().item_names().unwrap(),
            vec!["Luigi's", "Bangkok Garden", "Slice House"]
        );
        let unpublished = Recommender::new(Arc::new(SnapshotHandle::new()));
        assert!(matches!(unpublished.item_names(), Err(Error::NotFitted)));
    }

    #[test]
    fn test_scene_items() {
        let recommender = recommender();
        let items = recommender.scene_items("dating").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "a");
        assert!(recommender.scene_items("family").unwrap().is_empty());
    }
}
