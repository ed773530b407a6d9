//! Offline ranking-quality evaluation.
//!
//! Every item satisfying a [`Relevance`] predicate is used as a query
//! against the index; its top-K neighbors are scored against the full
//! relevant set (which includes the query item itself).

use crate::index::SimilarityIndex;
use crate::item::Item;
use crate::{Error, Result};
use ahash::AHashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_EVAL_KS: [usize; 3] = [1, 5, 10];

/// Which items count as relevant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "threshold", rename_all = "snake_case")]
pub enum Relevance {
    MinRating(f32),
    MinReviewCount(u64),
    /// review_count at or above the corpus median
    MedianReviewCount,
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relevance::MinRating(t) => write!(f, "rating >= {t}"),
            Relevance::MinReviewCount(t) => write!(f, "review_count >= {t}"),
            Relevance::MedianReviewCount => write!(f, "review_count >= median"),
        }
    }
}

impl Relevance {
    /// Indices of relevant items, ascending.
    pub fn relevant_set(&self, items: &[Item]) -> Vec<usize> {
        let keep: Box<dyn Fn(&Item) -> bool> = match *self {
            Relevance::MinRating(t) => Box::new(move |item: &Item| item.rating >= t),
            Relevance::MinReviewCount(t) => Box::new(move |item: &Item| item.review_count >= t),
            Relevance::MedianReviewCount => {
                let median = median_review_count(items);
                Box::new(move |item: &Item| item.review_count as f64 >= median)
            }
        };
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| keep(*item))
            .map(|(i, _)| i)
            .collect()
    }
}

fn median_review_count(items: &[Item]) -> f64 {
    let mut counts: Vec<u64> = items.iter().map(|i| i.review_count).collect();
    if counts.is_empty() {
        return 0.0;
    }
    counts.sort_unstable();
    let mid = counts.len() / 2;
    if counts.len() % 2 == 0 {
        (counts[mid - 1] as f64 + counts[mid] as f64) / 2.0
    } else {
        counts[mid] as f64
    }
}

/// Averaged metrics at one cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingMetrics {
    pub k: usize,
    /// Number of query items
    pub queries: usize,
    pub hit_rate: f64,
    pub precision: f64,
    pub recall: f64,
    /// Harmonic mean of `precision` and `recall`
    pub f1: f64,
    pub ndcg: f64,
}

impl RankingMetrics {
    pub fn report(&self) -> String {
        format!(
            "@{:<3} queries={:<5} hit={:.4} precision={:.4} recall={:.4} f1={:.4} ndcg={:.4}",
            self.k, self.queries, self.hit_rate, self.precision, self.recall, self.f1, self.ndcg
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct QueryScore {
    hit: f64,
    precision: f64,
    recall: f64,
    ndcg: f64,
}

/// DCG of a binary hit vector with log2(rank + 2) discount
fn dcg(hits: &[bool]) -> f64 {
    hits.iter()
        .enumerate()
        .filter(|(_, hit)| **hit)
        .map(|(rank, _)| 1.0 / (rank as f64 + 2.0).log2())
        .sum()
}

fn ideal_dcg(relevant: usize, k: usize) -> f64 {
    (0..relevant.min(k))
        .map(|rank| 1.0 / (rank as f64 + 2.0).log2())
        .sum()
}

pub struct EvaluationHarness<'a> {
    index: &'a SimilarityIndex,
    items: &'a [Item],
}

impl<'a> EvaluationHarness<'a> {
    /// `items[i]` must describe corpus position `i` of `index`.
    pub fn new(index: &'a SimilarityIndex, items: &'a [Item]) -> Result<Self> {
        if index.len() != items.len() {
            return Err(Error::InvalidDimension {
                expected: index.len(),
                actual: items.len(),
            });
        }
        Ok(Self { index, items })
    }

    pub fn evaluate(&self, relevance: Relevance, k: usize) -> Result<RankingMetrics> {
        let relevant = relevance.relevant_set(self.items);
        self.score(&relevant, k)
    }

    /// One row per cutoff, in the order given.
    pub fn evaluate_at(&self, relevance: Relevance, ks: &[usize]) -> Result<Vec<RankingMetrics>> {
        let relevant = relevance.relevant_set(self.items);
        ks.iter().map(|&k| self.score(&relevant, k)).collect()
    }

    fn score(&self, relevant: &[usize], k: usize) -> Result<RankingMetrics> {
        if k == 0 {
            return Err(Error::InvalidConfig("evaluation cutoff must be positive".into()));
        }
        let relevant_set: AHashSet<usize> = relevant.iter().copied().collect();
        let idcg = ideal_dcg(relevant.len(), k);

        let per_query: Vec<QueryScore> = relevant
            .par_iter()
            .map(|&query| self.score_query(query, k, &relevant_set, idcg))
            .collect::<Result<_>>()?;

        let queries = per_query.len();
        let mean = |f: fn(&QueryScore) -> f64| {
            if queries == 0 {
                0.0
            } else {
                per_query.iter().map(f).sum::<f64>() / queries as f64
            }
        };
        let precision = mean(|q| q.precision);
        let recall = mean(|q| q.recall);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Ok(RankingMetrics {
            k,
            queries,
            hit_rate: mean(|q| q.hit),
            precision,
            recall,
            f1,
            ndcg: mean(|q| q.ndcg),
        })
    }

    fn score_query(
        &self,
        query: usize,
        k: usize,
        relevant: &AHashSet<usize>,
        idcg: f64,
    ) -> Result<QueryScore> {
        let neighbors = self.index.query_by_index(query, k)?;
        let hits: Vec<bool> = neighbors
            .iter()
            .map(|n| relevant.contains(&n.index))
            .collect();
        let count = hits.iter().filter(|h| **h).count() as f64;
        Ok(QueryScore {
            hit: if count > 0.0 { 1.0 } else { 0.0 },
            precision: count / k as f64,
            recall: count / relevant.len() as f64,
            ndcg: if idcg > 0.0 { dcg(&hits) / idcg } else { 0.0 },
        })
    }
}
