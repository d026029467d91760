//! Fakes shared by the integration tests of the tutor crates.
//!
//! Nothing here touches the network or downloads model weights.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tutor_common::{Candidate, Language};
use tutor_llm::{GenerationBackend, LlmError, PromptStyle, ShapedPrompt};
use tutor_models::{
    ModelError, ModelLoader, SamplingParams, SequenceClassifier, TextGenerator, Translator,
    INTENT_LABELS,
};

/// `n` space-separated words.
pub fn words(n: usize) -> String {
    vec!["lorem"; n].join(" ")
}

// ── Backends ──────────────────────────────────────────────────────────────────

/// Backend that replays a script of outcomes, repeating the last one.
pub struct ScriptedBackend {
    name: String,
    local: bool,
    script: Mutex<VecDeque<Result<Vec<Candidate>, String>>>,
    last: Mutex<Option<Result<Vec<Candidate>, String>>>,
    prompts: Mutex<Vec<ShapedPrompt>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn with_script(name: &str, script: Vec<Result<Vec<Candidate>, String>>) -> Self {
        Self {
            name: name.to_string(),
            local: false,
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with one candidate per text, scored 0.95, 0.85, …
    pub fn answering(name: &str, texts: &[&str]) -> Self {
        let candidates = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Candidate::new(*t, 0.95 - i as f32 * 0.1))
            .collect();
        Self::with_script(name, vec![Ok(candidates)])
    }

    /// Always fails with `message`.
    pub fn failing(name: &str, message: &str) -> Self {
        Self::with_script(name, vec![Err(message.to_string())])
    }

    /// Always succeeds with zero candidates.
    pub fn empty(name: &str) -> Self {
        Self::with_script(name, vec![Ok(Vec::new())])
    }

    /// Report as a local backend (seq2seq prompt style).
    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<ShapedPrompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_local(&self) -> bool {
        self.local
    }

    fn prompt_style(&self) -> PromptStyle {
        if self.local { PromptStyle::Seq2Seq } else { PromptStyle::Chat }
    }

    async fn generate(&self, prompt: &ShapedPrompt) -> Result<Vec<Candidate>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());

        let next = self.script.lock().unwrap().pop_front();
        let outcome = {
            let mut last = self.last.lock().unwrap();
            if let Some(next) = next {
                *last = Some(next);
            }
            last.clone().unwrap_or_else(|| Err("empty script".to_string()))
        };
        outcome.map_err(LlmError::Unavailable)
    }
}

// ── Models ────────────────────────────────────────────────────────────────────

/// Generator returning fixed outputs, optionally after a delay.
pub struct FakeGenerator {
    pub outputs: Vec<String>,
    pub delay: Duration,
}

impl FakeGenerator {
    pub fn new(outputs: &[&str]) -> Self {
        Self { outputs: outputs.iter().map(|s| s.to_string()).collect(), delay: Duration::ZERO }
    }
}

impl TextGenerator for FakeGenerator {
    fn model_id(&self) -> &str {
        "fake-generator"
    }

    fn generate(&self, _prompt: &str, params: &SamplingParams) -> tutor_models::Result<Vec<String>> {
        std::thread::sleep(self.delay);
        Ok(self.outputs.iter().take(params.num_return_sequences.max(1)).cloned().collect())
    }
}

/// Classifier returning a fixed distribution over the intent labels.
pub struct FakeClassifier {
    pub probabilities: Vec<f32>,
}

impl FakeClassifier {
    /// All mass on `label`.
    pub fn certain(label: &str) -> Self {
        Self {
            probabilities: INTENT_LABELS.iter().map(|l| if *l == label { 1.0 } else { 0.0 }).collect(),
        }
    }
}

impl SequenceClassifier for FakeClassifier {
    fn model_id(&self) -> &str {
        "fake-classifier"
    }

    fn probabilities(&self, _text: &str) -> tutor_models::Result<Vec<f32>> {
        Ok(self.probabilities.clone())
    }
}

/// Translator that tags the input with the target code and counts calls.
#[derive(Default)]
pub struct FakeTranslator {
    calls: AtomicUsize,
}

impl FakeTranslator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Translator for FakeTranslator {
    fn model_id(&self) -> &str {
        "fake-translator"
    }

    fn translate(&self, text: &str, _source: Language, target: Language, _params: &SamplingParams) -> tutor_models::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{}] {}", target.code(), text))
    }
}

// ── Loaders ───────────────────────────────────────────────────────────────────

/// Hands out a prebuilt model and counts how often it was asked to.
pub struct CountingLoader<T: ?Sized + Send + Sync> {
    model: Arc<T>,
    delay: Duration,
    fail_first: AtomicBool,
    loads: Arc<AtomicUsize>,
}

impl<T: ?Sized + Send + Sync> CountingLoader<T> {
    pub fn new(model: Arc<T>) -> Self {
        Self {
            model,
            delay: Duration::ZERO,
            fail_first: AtomicBool::new(false),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep this long inside every load.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the first load attempt.
    pub fn failing_once(self) -> Self {
        self.fail_first.store(true, Ordering::SeqCst);
        self
    }

    /// Shared counter, readable after the loader moves into a cell.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.loads)
    }
}

#[async_trait]
impl<T: ?Sized + Send + Sync + 'static> ModelLoader<T> for CountingLoader<T> {
    fn model_id(&self) -> &str {
        "counting"
    }

    async fn load(&self) -> tutor_models::Result<Arc<T>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_first.swap(false, Ordering::SeqCst) {
            return Err(ModelError::Download("simulated download failure".to_string()));
        }
        Ok(Arc::clone(&self.model))
    }
}
