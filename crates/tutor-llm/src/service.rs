//! Generation entry point used by the HTTP layer.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use tutor_common::{GenerationRequest, GenerationResult};
use tutor_config::Config;
use tutor_models::{InferencePool, ModelCell, TextGenerator};

use crate::local::LocalBackend;
use crate::prompts;
use crate::provider::ProviderState;
use crate::quiz::{parse_quiz, QuizQuestion};
use crate::router::ProviderChain;

/// Quiz generation result plus the questions parsed from the best candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizOutcome {
    pub result: GenerationResult,
    pub questions: Vec<QuizQuestion>,
}

pub struct GenerationService {
    chain: ProviderChain,
    local_model: Option<Arc<ModelCell<dyn TextGenerator>>>,
}

impl GenerationService {
    pub fn new(chain: ProviderChain) -> Self {
        Self { chain, local_model: None }
    }

    /// Remote provider first (when available), local seq2seq model last.
    pub fn from_config(config: &Config, providers: &ProviderState, pool: InferencePool) -> Self {
        let mut chain = ProviderChain::new();
        if let Some(remote) = providers.remote() {
            chain.push(remote);
        }
        let local = LocalBackend::from_config(&config.models, &config.sampling, pool);
        let local_model = Arc::clone(local.cell());
        chain.push(Arc::new(local));

        Self { chain, local_model: Some(local_model) }
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// Whether the local generation model has been loaded.
    pub fn local_model_loaded(&self) -> bool {
        self.local_model.as_ref().is_some_and(|cell| cell.is_loaded())
    }

    /// Run one request through the chain. Blank input short-circuits.
    pub async fn generate(&self, req: &GenerationRequest) -> GenerationResult {
        if req.is_blank() {
            return GenerationResult::blank();
        }

        let prompt = prompts::shape(req);
        debug!(
            task = prompt.task.as_str(),
            complexity = ?prompt.complexity,
            max_tokens = prompt.max_tokens,
            temperature = prompt.temperature,
            "Prompt shaped"
        );
        self.chain.dispatch(&prompt).await
    }

    pub async fn answer(&self, prompt: &str, max_tokens: u32, temperature: f32) -> GenerationResult {
        self.generate(&GenerationRequest::answer(prompt, max_tokens, temperature)).await
    }

    pub async fn notes(&self, text: &str, max_tokens: u32, temperature: f32) -> GenerationResult {
        self.generate(&GenerationRequest::notes(text, max_tokens, temperature)).await
    }

    pub async fn quiz(&self, text: &str, num_questions: u32, max_tokens: u32, temperature: f32) -> QuizOutcome {
        let req = GenerationRequest::quiz(text, prompts::clamp_questions(Some(num_questions)), max_tokens, temperature);
        let result = self.generate(&req).await;
        let questions = if result.degraded {
            Vec::new()
        } else {
            result.first_text().map(parse_quiz).unwrap_or_default()
        };
        debug!(questions = questions.len(), "Quiz parsed");
        QuizOutcome { result, questions }
    }
}
