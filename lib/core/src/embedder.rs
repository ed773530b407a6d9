//! Dense sentence-embedding capability.
//!
//! Implementations must be deterministic for fixed weights, return exactly
//! [`Embedder::dimension`] values per text, and keep [`Embedder::id`] stable
//! across restarts: snapshots store the id and resolve the model by it when
//! loaded.

use crate::{Error, Result, Vector};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;

pub trait Embedder: Send + Sync + fmt::Debug {
    /// Embed one text into `self.dimension()` floats.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts. The default fans out across the rayon pool.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.par_iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize;

    /// Stable model identifier, e.g. `"hash-384"`
    fn id(&self) -> &str;
}

pub const HASH_MODEL_PREFIX: &str = "hash-";
/// Pretrained sentence encoder, resolved with the `fastembed` feature
pub const MINILM_MODEL_ID: &str = "all-MiniLM-L6-v2";
pub const MINILM_DIM: usize = 384;
pub const DEFAULT_HASH_DIM: usize = 384;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[inline]
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

/// Feature-hashing encoder over words and padded character trigrams.
///
/// No weights, no corpus fitting. Uses FNV-1a so output is identical across
/// runs, platforms and compiler versions.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_HASH_DIM,
            id: format!("{HASH_MODEL_PREFIX}{DEFAULT_HASH_DIM}"),
        }
    }
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig(
                "embedding dimension must be positive".to_string(),
            ));
        }
        Ok(Self {
            dim,
            id: format!("{HASH_MODEL_PREFIX}{dim}"),
        })
    }

    /// Parse a `hash-<dim>` model id.
    pub fn from_id(id: &str) -> Result<Self> {
        id.strip_prefix(HASH_MODEL_PREFIX)
            .and_then(|dim| dim.parse::<usize>().ok())
            .ok_or_else(|| Error::UnknownModel(id.to_string()))
            .and_then(Self::new)
    }

    #[inline]
    fn bucket(&self, bytes: &[u8]) -> usize {
        (fnv1a(bytes) % self.dim as u64) as usize
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dim];
        let normalized = text.to_lowercase();

        let padded: Vec<char> = format!("  {normalized}  ").chars().collect();
        let mut buf = String::with_capacity(12);
        for window in padded.windows(3) {
            buf.clear();
            buf.extend(window);
            vector[self.bucket(buf.as_bytes())] += 1.0;
        }

        // words weigh more than trigrams
        for word in normalized.split_whitespace() {
            vector[self.bucket(word.as_bytes())] += 2.0;
        }

        let mut vector = Vector::new(vector);
        vector.normalize();
        Ok(vector.into_inner())
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn id(&self) -> &str {
        &self.id
    }
}

fn is_minilm(id: &str) -> bool {
    id == MINILM_MODEL_ID || id.strip_prefix("sentence-transformers/") == Some(MINILM_MODEL_ID)
}

/// Resolve a model id to one of the embedders shipped with the crate:
/// `hash-<dim>` always, `all-MiniLM-L6-v2` with the `fastembed` feature.
pub fn resolve_builtin(id: &str) -> Result<Arc<dyn Embedder>> {
    if is_minilm(id) {
        return resolve_minilm(id);
    }
    Ok(Arc::new(HashEmbedder::from_id(id)?))
}

#[cfg(feature = "fastembed")]
fn resolve_minilm(_id: &str) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(crate::minilm::FastEmbedEmbedder::all_minilm_l6_v2()?))
}

#[cfg(not(feature = "fastembed"))]
fn resolve_minilm(id: &str) -> Result<Arc<dyn Embedder>> {
    Err(Error::UnknownModel(format!(
        "{id} (requires the `fastembed` feature)"
    )))
}
