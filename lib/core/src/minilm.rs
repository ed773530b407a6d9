//! Pretrained sentence encoder backed by fastembed (ONNX runtime).
//!
//! Available with the `fastembed` feature. Model files are downloaded into
//! the fastembed cache on first use.

use crate::embedder::{Embedder, MINILM_DIM, MINILM_MODEL_ID};
use crate::{Error, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use std::fmt;
use std::path::PathBuf;

/// `all-MiniLM-L6-v2` sentence embeddings (384 dims, mean pooled).
pub struct FastEmbedEmbedder {
    model: Mutex<TextEmbedding>,
}

impl fmt::Debug for FastEmbedEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastEmbedEmbedder")
            .field("model", &MINILM_MODEL_ID)
            .finish()
    }
}

impl FastEmbedEmbedder {
    pub fn all_minilm_l6_v2() -> Result<Self> {
        Self::with_options(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
    }

    /// Load from (or download into) `cache_dir`.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_cache_dir(cache_dir.into()),
        )
    }

    fn with_options(options: InitOptions) -> Result<Self> {
        let model = TextEmbedding::try_new(options.with_show_download_progress(false))
            .map_err(|e| Error::Embedding(format!("failed to load {MINILM_MODEL_ID}: {e}")))?;
        tracing::info!("Loaded sentence encoder {}", MINILM_MODEL_ID);
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl Embedder for FastEmbedEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| Error::Embedding("encoder returned no embedding".to_string()))
    }

    // The ONNX session batches internally; one call per build.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self
            .model
            .lock()
            .embed(texts.to_vec(), None)
            .map_err(|e| Error::Embedding(e.to_string()))?;
        if embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        MINILM_DIM
    }

    fn id(&self) -> &str {
        MINILM_MODEL_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs the model download; run with `--ignored` when online.
    #[test]
    #[ignore]
    fn test_minilm_paraphrases_are_close() {
        let embedder = FastEmbedEmbedder::all_minilm_l6_v2().unwrap();
        let vectors = embedder
            .embed_batch(&["cheap pizza slices", "inexpensive pizza", "quiet wine bar"])
            .unwrap();
        assert!(vectors.iter().all(|v| v.len() == MINILM_DIM));
        let sim = |a: &[f32], b: &[f32]| crate::simd::dot(a, b) / (crate::simd::norm(a) * crate::simd::norm(b));
        assert!(sim(&vectors[0], &vectors[1]) > sim(&vectors[0], &vectors[2]));
    }
}
