//! Pairwise cosine similarity index.
//!
//! The full N×N matrix is computed once in [`SimilarityIndex::build`] and
//! never mutated afterwards. Rows are filled in parallel; each entry comes
//! from the same fixed-order kernel whichever row computes it, so
//! `sim[i][j]` and `sim[j][i]` are bitwise equal.
//!
//! Two query paths exist on purpose:
//! - [`SimilarityIndex::query_by_id`] reads a precomputed row (full fused
//!   vectors).
//! - [`SimilarityIndex::query_by_vector`] scores an outside vector directly,
//!   against the text-only prefix of each item when the query is text-only.
//!
//! Top-K ties are broken by ascending corpus index.

use crate::simd::{cosine_with_norms, norm};
use crate::{Error, Result, Vector};
use ahash::AHashMap;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

pub const DEFAULT_K: usize = 10;

/// One ranked result: corpus position and cosine score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub index: usize,
    pub score: f32,
}

// Ordered so that "greater" means "ranks higher".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ranked {
    score: OrderedFloat<f32>,
    index: usize,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best `k` of `scores`, best first.
pub fn top_k<I>(scores: I, k: usize) -> Vec<Neighbor>
where
    I: IntoIterator<Item = (usize, f32)>,
{
    if k == 0 {
        return Vec::new();
    }
    // min-heap of the current best k; the root is the weakest kept entry
    let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::with_capacity(k + 1);
    for (index, score) in scores {
        let candidate = Ranked {
            score: OrderedFloat(score),
            index,
        };
        if heap.len() < k {
            heap.push(Reverse(candidate));
        } else if let Some(Reverse(worst)) = heap.peek() {
            if candidate > *worst {
                heap.pop();
                heap.push(Reverse(candidate));
            }
        }
    }
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(r)| Neighbor {
            index: r.index,
            score: r.score.into_inner(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SimilarityIndexData")]
pub struct SimilarityIndex {
    ids: Vec<String>,
    vectors: Vec<Vector>,
    text_dim: usize,
    /// Row-major N×N
    matrix: Vec<f32>,
    #[serde(skip)]
    positions: AHashMap<String, usize>,
    #[serde(skip)]
    norms: Vec<f32>,
    #[serde(skip)]
    text_norms: Vec<f32>,
}

impl SimilarityIndex {
    /// Compute the full similarity matrix over `vectors`.
    ///
    /// `text_dim` is the width of the text prefix of every vector; the
    /// remainder is the numeric block.
    pub fn build(ids: Vec<String>, vectors: Vec<Vector>, text_dim: usize) -> Result<Self> {
        let mut index = Self::assemble(ids, vectors, text_dim, Vec::new())?;
        let n = index.ids.len();

        let mut matrix = vec![0.0f32; n * n];
        {
            let vectors = &index.vectors;
            let norms = &index.norms;
            matrix
                .par_chunks_mut(n)
                .enumerate()
                .for_each(|(i, row)| {
                    let a = vectors[i].as_slice();
                    for (j, cell) in row.iter_mut().enumerate() {
                        *cell = if i == j {
                            1.0
                        } else {
                            cosine_with_norms(a, vectors[j].as_slice(), norms[i], norms[j])
                        };
                    }
                });
        }
        index.matrix = matrix;
        Ok(index)
    }

    fn assemble(
        ids: Vec<String>,
        vectors: Vec<Vector>,
        text_dim: usize,
        matrix: Vec<f32>,
    ) -> Result<Self> {
        if ids.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        if ids.len() != vectors.len() {
            return Err(Error::InvalidDimension {
                expected: ids.len(),
                actual: vectors.len(),
            });
        }
        let dim = vectors[0].dim();
        if let Some(bad) = vectors.iter().find(|v| v.dim() != dim) {
            return Err(Error::InvalidDimension {
                expected: dim,
                actual: bad.dim(),
            });
        }
        if text_dim > dim {
            return Err(Error::InvalidDimension {
                expected: dim,
                actual: text_dim,
            });
        }

        let mut positions = AHashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if positions.insert(id.clone(), i).is_some() {
                return Err(Error::DuplicateItem(id.clone()));
            }
        }

        let norms = vectors.iter().map(|v| v.norm()).collect();
        let text_norms = vectors
            .iter()
            .map(|v| norm(&v.as_slice()[..text_dim]))
            .collect();

        Ok(Self {
            ids,
            vectors,
            text_dim,
            matrix,
            positions,
            norms,
            text_norms,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Width of stored (fused) vectors
    #[inline]
    pub fn dim(&self) -> usize {
        self.vectors.first().map_or(0, Vector::dim)
    }

    #[inline]
    pub fn text_dim(&self) -> usize {
        self.text_dim
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn id(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn vector(&self, index: usize) -> Option<&Vector> {
        self.vectors.get(index)
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let n = self.len();
        (index < n).then(|| &self.matrix[index * n..(index + 1) * n])
    }

    pub fn similarity(&self, i: usize, j: usize) -> Option<f32> {
        self.row(i).and_then(|row| row.get(j).copied())
    }

    pub fn matrix(&self) -> &[f32] {
        &self.matrix
    }

    /// The `k` items most similar to `id`, never including `id` itself.
    /// `k` is clamped to N−1.
    pub fn query_by_id(&self, id: &str, k: usize) -> Result<Vec<Neighbor>> {
        let index = self
            .position(id)
            .ok_or_else(|| Error::UnknownItem(id.to_string()))?;
        self.query_by_index(index, k)
    }

    pub fn query_by_index(&self, index: usize, k: usize) -> Result<Vec<Neighbor>> {
        let row = self
            .row(index)
            .ok_or_else(|| Error::UnknownItem(index.to_string()))?;
        let k = k.min(self.len() - 1);
        let scores = row
            .iter()
            .copied()
            .enumerate()
            .filter(|(j, _)| *j != index);
        Ok(top_k(scores, k))
    }

    /// Score an outside vector against every item; `k` is clamped to N.
    ///
    /// A query of width `text_dim` is compared with the text prefix of each
    /// item; a query of the full width with whole vectors. A zero-norm query
    /// matches nothing and returns no results.
    pub fn query_by_vector(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let (width, norms) = if query.len() == self.text_dim {
            (self.text_dim, &self.text_norms)
        } else if query.len() == self.dim() {
            (self.dim(), &self.norms)
        } else {
            return Err(Error::InvalidDimension {
                expected: self.text_dim,
                actual: query.len(),
            });
        };

        let query_norm = norm(query);
        if query_norm == 0.0 {
            return Ok(Vec::new());
        }

        let scores: Vec<f32> = self
            .vectors
            .par_iter()
            .zip(norms.par_iter())
            .map(|(v, n)| cosine_with_norms(query, &v.as_slice()[..width], query_norm, *n))
            .collect();

        Ok(top_k(scores.into_iter().enumerate(), k.min(self.len())))
    }
}

// Persisted layout of a `SimilarityIndex`, validated on load.
#[derive(Deserialize)]
struct SimilarityIndexData {
    ids: Vec<String>,
    vectors: Vec<Vector>,
    text_dim: usize,
    matrix: Vec<f32>,
}

impl TryFrom<SimilarityIndexData> for SimilarityIndex {
    type Error = Error;

    fn try_from(data: SimilarityIndexData) -> Result<Self> {
        let n = data.ids.len();
        if data.matrix.len() != n * n {
            return Err(Error::Serialization(format!(
                "similarity matrix has {} entries, expected {}",
                data.matrix.len(),
                n * n
            )));
        }
        Self::assemble(data.ids, data.vectors, data.text_dim, data.matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item-{i}")).collect()
    }

    fn random_index(n: usize, dim: usize, text_dim: usize, seed: u64) -> SimilarityIndex {
        let mut rng = StdRng::seed_from_u64(seed);
        let vectors = (0..n)
            .map(|_| Vector::new((0..dim).map(|_| rng.random_range(-1.0f32..1.0)).collect()))
            .collect();
        SimilarityIndex::build(ids(n), vectors, text_dim).unwrap()
    }

    #[test]
    fn test_matrix_symmetric_with_unit_diagonal() {
        let index = random_index(40, 19, 15, 7);
        for i in 0..index.len() {
            assert_eq!(index.similarity(i, i), Some(1.0));
            for j in 0..index.len() {
                let sij = index.similarity(i, j).unwrap();
                let sji = index.similarity(j, i).unwrap();
                assert!((sij - sji).abs() < 1e-6);
                assert!((-1.0..=1.0).contains(&sij));
            }
        }
    }

    #[test]
    fn test_rebuild_is_bitwise_identical() {
        let a = random_index(25, 12, 8, 99);
        let b = random_index(25, 12, 8, 99);
        assert_eq!(a.matrix(), b.matrix());
    }

    #[test]
    fn test_query_by_id_excludes_self_and_clamps() {
        let index = random_index(12, 8, 4, 3);
        for i in 0..index.len() {
            let id = index.id(i).unwrap().to_string();
            for k in [0, 1, 5, 11, 50] {
                let results = index.query_by_id(&id, k).unwrap();
                assert_eq!(results.len(), k.min(index.len() - 1));
                assert!(results.iter().all(|n| n.index != i));
                assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
            }
        }
    }

    #[test]
    fn test_unknown_item() {
        let index = random_index(3, 4, 2, 1);
        let err = index.query_by_id("missing", 2).unwrap_err();
        assert!(matches!(err, Error::UnknownItem(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_ties_break_by_ascending_index() {
        let vectors = vec![
            Vector::new(vec![1.0, 0.0]),
            Vector::new(vec![0.0, 1.0]),
            Vector::new(vec![0.0, 1.0]),
            Vector::new(vec![0.0, 1.0]),
        ];
        let index = SimilarityIndex::build(ids(4), vectors, 2).unwrap();
        let results = index.query_by_id("item-1", 2).unwrap();
        let order: Vec<usize> = results.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![2, 3]);

        let all = index.query_by_vector(&[0.0, 1.0], 10).unwrap();
        let order: Vec<usize> = all.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_query_by_vector_text_prefix() {
        // text prefix [1, 0] vs [0, 1]; numeric suffix identical
        let vectors = vec![
            Vector::new(vec![1.0, 0.0, 5.0, 5.0]),
            Vector::new(vec![0.0, 1.0, 5.0, 5.0]),
        ];
        let index = SimilarityIndex::build(ids(2), vectors, 2).unwrap();

        let text_only = index.query_by_vector(&[0.0, 1.0], 1).unwrap();
        assert_eq!(text_only[0].index, 1);
        assert!((text_only[0].score - 1.0).abs() < 1e-6);

        let full = index.query_by_vector(&[1.0, 0.0, 5.0, 5.0], 2).unwrap();
        assert_eq!(full[0].index, 0);
        assert!(full[1].score > 0.9);
    }

    #[test]
    fn test_query_by_vector_errors_and_empty() {
        let index = random_index(5, 6, 4, 11);
        assert!(matches!(
            index.query_by_vector(&[1.0; 5], 3),
            Err(Error::InvalidDimension { .. })
        ));
        assert!(index.query_by_vector(&[0.0; 4], 3).unwrap().is_empty());
        assert_eq!(index.query_by_vector(&[1.0; 4], 50).unwrap().len(), 5);
    }

    #[test]
    fn test_zero_vector_similarity_is_zero() {
        let vectors = vec![Vector::new(vec![0.0, 0.0]), Vector::new(vec![1.0, 1.0])];
        let index = SimilarityIndex::build(ids(2), vectors, 2).unwrap();
        assert_eq!(index.similarity(0, 1), Some(0.0));
        assert_eq!(index.similarity(0, 0), Some(1.0));
    }

    #[test]
    fn test_build_validation() {
        assert!(matches!(
            SimilarityIndex::build(Vec::new(), Vec::new(), 0),
            Err(Error::EmptyCorpus)
        ));
        let dup = vec!["a".to_string(), "a".to_string()];
        let vectors = vec![Vector::zeros(2), Vector::zeros(2)];
        assert!(matches!(
            SimilarityIndex::build(dup, vectors, 2),
            Err(Error::DuplicateItem(_))
        ));
        let ragged = vec![Vector::zeros(2), Vector::zeros(3)];
        assert!(matches!(
            SimilarityIndex::build(ids(2), ragged, 2),
            Err(Error::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_serde_restores_positions() {
        let index = random_index(6, 5, 3, 21);
        let json = serde_json::to_string(&index).unwrap();
        let restored: SimilarityIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.position("item-4"), Some(4));
        assert_eq!(
            restored.query_by_id("item-0", 3).unwrap(),
            index.query_by_id("item-0", 3).unwrap()
        );
    }

    #[test]
    fn test_serde_rejects_truncated_matrix() {
        let json = r#"{"ids":["a","b"],"vectors":[{"data":[1.0]},{"data":[1.0]}],"text_dim":1,"matrix":[1.0]}"#;
        assert!(serde_json::from_str::<SimilarityIndex>(json).is_err());
    }
}
