//! Local seq2seq backend: the last resort in the provider chain.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::info;
use tutor_common::confidence::{ranked_scores, LOCAL_SCORE_DECREMENT};
use tutor_common::Candidate;
use tutor_config::{ModelsConfig, SamplingConfig};
use tutor_models::{
    InferencePool, ModelCell, ModelFamily, ModelSpec, SamplingParams, Seq2SeqLoader, TextGenerator,
};

use crate::backend::{GenerationBackend, LlmError};
use crate::prompts::{PromptStyle, ShapedPrompt};

pub struct LocalBackend {
    cell: Arc<ModelCell<dyn TextGenerator>>,
    pool: InferencePool,
    params: SamplingParams,
}

impl LocalBackend {
    pub fn new(cell: Arc<ModelCell<dyn TextGenerator>>, pool: InferencePool, params: SamplingParams) -> Self {
        Self { cell, pool, params }
    }

    /// Backend over the configured generation checkpoint. Nothing is
    /// downloaded until the first request reaches this backend.
    pub fn from_config(models: &ModelsConfig, sampling: &SamplingConfig, pool: InferencePool) -> Self {
        let spec = ModelSpec::from_config(models, ModelFamily::Generation);
        let cell: ModelCell<dyn TextGenerator> =
            ModelCell::new(ModelFamily::Generation, Seq2SeqLoader::new(spec, pool.clone()));
        Self::new(Arc::new(cell), pool, SamplingParams::from_config(sampling))
    }

    pub fn cell(&self) -> &Arc<ModelCell<dyn TextGenerator>> {
        &self.cell
    }
}

#[async_trait]
impl GenerationBackend for LocalBackend {
    fn name(&self) -> &str { "local" }
    fn is_local(&self) -> bool { true }
    fn prompt_style(&self) -> PromptStyle { PromptStyle::Seq2Seq }

    async fn generate(&self, prompt: &ShapedPrompt) -> Result<Vec<Candidate>, LlmError> {
        let start = Instant::now();
        let model = self.cell.get().await?;

        let text = prompt.text_for(PromptStyle::Seq2Seq).to_string();
        let params = self
            .params
            .clone()
            .with_budget(prompt.max_tokens as usize, prompt.temperature as f64);
        let outputs = self.pool.run(move || model.generate(&text, &params)).await?;

        info!(
            model_id = self.cell.model_id(),
            candidates = outputs.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Local generation finished"
        );

        let scores = ranked_scores(outputs.len(), LOCAL_SCORE_DECREMENT);
        Ok(outputs
            .into_iter()
            .zip(scores)
            .map(|(text, score)| Candidate::new(text, score))
            .collect())
    }
}
