//! Configuration for loading a local model.

use serde::{Deserialize, Serialize};
use tutor_config::ModelsConfig;

use crate::cell::ModelFamily;

/// Where a local model comes from and how it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Hugging Face model ID
    pub model_id: String,

    /// Cache directory for downloaded models
    pub cache_dir: Option<String>,

    /// Use GPU if available (default: true)
    pub use_gpu: bool,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::from_config(&ModelsConfig::default(), ModelFamily::Generation)
    }
}

impl ModelSpec {
    /// Spec for one model family taken from the `[models]` section.
    pub fn from_config(config: &ModelsConfig, family: ModelFamily) -> Self {
        let model_id = match family {
            ModelFamily::Generation  => config.generation.clone(),
            ModelFamily::Translation => config.translation.clone(),
            ModelFamily::Intent      => config.intent.clone(),
        };
        Self {
            model_id,
            cache_dir: config.cache_dir.clone(),
            use_gpu: config.use_gpu,
        }
    }

    /// Create config for CPU-only inference.
    pub fn cpu(mut self) -> Self {
        self.use_gpu = false;
        self
    }

    /// Use a custom model.
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<String>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }
}
