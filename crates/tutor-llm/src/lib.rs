//! tutor-llm — remote-first generation with local fallback.
//!
//! A request is shaped once (template, complexity tier, token budget,
//! clamped temperature) and then offered to an ordered chain of backends:
//! the remote chat-completion provider when a key is configured, then the
//! local seq2seq model. The first non-empty answer wins; if every backend
//! fails the caller gets an explicitly degraded placeholder.

pub mod backend;
pub mod local;
pub mod prompts;
pub mod provider;
pub mod quiz;
pub mod router;
pub mod service;

pub use backend::{GenerationBackend, GroqBackend, LlmError};
pub use local::LocalBackend;
pub use prompts::{Complexity, PromptStyle, ShapedPrompt};
pub use provider::ProviderState;
pub use quiz::{parse_quiz, QuizQuestion};
pub use router::ProviderChain;
pub use service::{GenerationService, QuizOutcome};
