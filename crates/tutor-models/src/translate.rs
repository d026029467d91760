//! Translation between the supported languages.
//!
//! A single multilingual seq2seq checkpoint serves every pair; the target is
//! chosen by prefixing the input with a `<2xx>` language tag.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use tutor_common::Language;
use tutor_config::{ModelsConfig, SamplingConfig};

use crate::cell::{ModelCell, ModelFamily, ModelLoader};
use crate::seq2seq::{Seq2SeqLoader, Seq2SeqModel, TextGenerator};
use crate::{InferencePool, ModelSpec, Result, SamplingParams};

/// Blocking single-text translation.
pub trait Translator: Send + Sync {
    fn model_id(&self) -> &str;

    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
        params: &SamplingParams,
    ) -> Result<String>;
}

/// Input text with the target-language tag the model expects.
pub fn tagged_input(text: &str, target: Language) -> String {
    format!("<2{}> {}", target.code(), text.trim())
}

impl Translator for Seq2SeqModel {
    fn model_id(&self) -> &str {
        TextGenerator::model_id(self)
    }

    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
        params: &SamplingParams,
    ) -> Result<String> {
        debug!(source = source.code(), target = target.code(), "Translating");
        let outputs = self.generate(&tagged_input(text, target), params)?;
        Ok(outputs.into_iter().next().unwrap_or_default())
    }
}

#[async_trait]
impl ModelLoader<dyn Translator> for Seq2SeqLoader {
    fn model_id(&self) -> &str {
        &self.spec().model_id
    }

    async fn load(&self) -> Result<Arc<dyn Translator>> {
        let model: Arc<dyn Translator> = self.load_model().await?;
        Ok(model)
    }
}

/// Validates language pairs and dispatches to the memoized translation model.
pub struct TranslationService {
    cell: ModelCell<dyn Translator>,
    pool: InferencePool,
    params: SamplingParams,
}

impl TranslationService {
    pub fn new(cell: ModelCell<dyn Translator>, pool: InferencePool, params: SamplingParams) -> Self {
        Self { cell, pool, params }
    }

    /// Service backed by the configured multilingual checkpoint.
    pub fn from_config(models: &ModelsConfig, sampling: &SamplingConfig, pool: InferencePool) -> Self {
        let spec = ModelSpec::from_config(models, ModelFamily::Translation);
        let cell: ModelCell<dyn Translator> =
            ModelCell::new(ModelFamily::Translation, Seq2SeqLoader::new(spec, pool.clone()));
        let mut params = SamplingParams::from_config(sampling).greedy(sampling.translation_max_tokens);
        params.no_repeat_ngram_size = 0;
        Self::new(cell, pool, params)
    }

    /// Translate `text` from `source` to `target` (ISO 639-1 codes).
    ///
    /// Unknown codes fail before any model work. Blank text yields an empty
    /// string and identical languages return the input untouched; neither
    /// loads the model.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let (source, target) = Language::resolve_pair(source, target)?;

        if text.trim().is_empty() {
            return Ok(String::new());
        }
        if source == target {
            return Ok(text.to_string());
        }

        let model = self.cell.get().await?;
        let text = text.to_string();
        let params = self.params.clone();
        let translated = self
            .pool
            .run(move || model.translate(&text, source, target, &params))
            .await?;

        info!(source = source.code(), target = target.code(), chars = translated.len(), "Translation done");
        Ok(translated)
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.is_loaded()
    }

    pub fn model_id(&self) -> &str {
        self.cell.model_id()
    }
}
