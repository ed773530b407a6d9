//! Build configuration.
//!
//! Loaded from JSON; every field has a default so a partial file (or none at
//! all) is valid.
//!
//! ```json
//! {
//!   "vectorizer": { "kind": "tfidf", "max_features": 5000 },
//!   "numeric_policy": "strict",
//!   "review_language": "en",
//!   "price_symbols": "$€£¥"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tastematch_core::embedder::{resolve_builtin, Embedder};
use tastematch_core::item::DEFAULT_PRICE_SYMBOLS;
use tastematch_core::tags::DEFAULT_REVIEW_LANGUAGE;
use tastematch_core::tfidf::DEFAULT_MAX_FEATURES;
use tastematch_core::{Error, NumericPolicy, Result, TextVectorizer};

fn default_max_features() -> Option<usize> {
    Some(DEFAULT_MAX_FEATURES)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VectorizerConfig {
    /// `max_features: null` keeps every term
    Tfidf {
        #[serde(default = "default_max_features")]
        max_features: Option<usize>,
    },
    Dense { model: String },
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        VectorizerConfig::Tfidf {
            max_features: default_max_features(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub vectorizer: VectorizerConfig,
    pub numeric_policy: NumericPolicy,
    pub review_language: String,
    pub price_symbols: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerConfig::default(),
            numeric_policy: NumericPolicy::default(),
            review_language: DEFAULT_REVIEW_LANGUAGE.to_string(),
            price_symbols: DEFAULT_PRICE_SYMBOLS.to_string(),
        }
    }
}

impl BuildConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        match &self.vectorizer {
            VectorizerConfig::Tfidf {
                max_features: Some(0),
            } => {
                return Err(Error::InvalidConfig(
                    "max_features must be positive".to_string(),
                ))
            }
            VectorizerConfig::Dense { model } if model.trim().is_empty() => {
                return Err(Error::InvalidConfig("dense model id is empty".to_string()))
            }
            _ => {}
        }
        if self.review_language.trim().is_empty() {
            return Err(Error::InvalidConfig("review_language is empty".to_string()));
        }
        if self.price_symbols.is_empty() {
            return Err(Error::InvalidConfig("price_symbols is empty".to_string()));
        }
        Ok(())
    }

    /// Unfitted vectorizer for this configuration. `embedder` overrides the
    /// built-in model lookup for the dense variant.
    pub fn text_vectorizer(&self, embedder: Option<Arc<dyn Embedder>>) -> Result<TextVectorizer> {
        match &self.vectorizer {
            VectorizerConfig::Tfidf { max_features } => Ok(TextVectorizer::tfidf(*max_features)),
            VectorizerConfig::Dense { model } => {
                let embedder = match embedder {
                    Some(embedder) if embedder.id() != model => {
                        return Err(Error::InvalidConfig(format!(
                            "configured model {model} but embedder reports {}",
                            embedder.id()
                        )))
                    }
                    Some(embedder) => embedder,
                    // built-in ids may be aliases of the canonical one
                    None => resolve_builtin(model)?,
                };
                Ok(TextVectorizer::dense(embedder))
            }
        }
    }
}
