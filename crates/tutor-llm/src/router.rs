//! Ordered provider chain: first success wins, failures fall through.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use tutor_common::GenerationResult;

use crate::backend::{GenerationBackend, LlmError};
use crate::prompts::ShapedPrompt;

/// Backends tried in order for every request.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn GenerationBackend>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, backend: Arc<dyn GenerationBackend>) {
        self.providers.push(backend);
    }

    pub fn with(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.push(backend);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Try each backend in order and return the first non-empty result.
    ///
    /// Never fails: when every backend errors the result is the degraded
    /// placeholder carrying the collected reasons.
    pub async fn dispatch(&self, prompt: &ShapedPrompt) -> GenerationResult {
        let mut failures: Vec<String> = Vec::new();

        for backend in &self.providers {
            let start = Instant::now();
            match backend.generate(prompt).await {
                Ok(candidates) if !candidates.is_empty() => {
                    info!(
                        provider = backend.name(),
                        task = prompt.task.as_str(),
                        is_local = backend.is_local(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Generation served"
                    );
                    return GenerationResult::from_provider(backend.name(), candidates);
                }
                Ok(_) => {
                    warn!(provider = backend.name(), "Provider returned no candidates, falling through");
                    failures.push(format!("{}: {}", backend.name(), LlmError::EmptyResponse));
                }
                Err(e) => {
                    warn!(provider = backend.name(), error = %e, "Provider failed, falling through");
                    failures.push(format!("{}: {}", backend.name(), e));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no providers configured".to_string());
        }
        let reason = failures.join("; ");
        error!(task = prompt.task.as_str(), reason = %reason, "All providers failed");
        GenerationResult::degraded(reason)
    }
}
