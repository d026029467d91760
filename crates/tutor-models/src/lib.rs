//! Local models for the tutor service, using Candle (Hugging Face).
//!
//! No Python dependency: weights and tokenizers come straight from the
//! Hugging Face hub and run on CPU, CUDA or Metal.
//!
//! # Features
//! - T5-family seq2seq generation with top-k/top-p sampling and a
//!   no-repeat n-gram constraint
//! - Multilingual translation through the same seq2seq runtime
//! - BERT intent classification
//! - Trigram language identification (no model download)
//! - One load per model family, shared by all requests, on a bounded
//!   blocking pool
//!
//! # Example
//! ```rust,no_run
//! use tutor_models::{ModelSpec, SamplingParams, Seq2SeqModel, TextGenerator};
//!
//! fn main() -> tutor_models::Result<()> {
//!     let model = Seq2SeqModel::load(&ModelSpec::default().cpu())?;
//!     let outputs = model.generate("Explain gravity in one sentence.", &SamplingParams::default())?;
//!     println!("{}", outputs[0]);
//!     Ok(())
//! }
//! ```

pub mod cell;
pub mod config;
pub mod error;
pub mod hub;
pub mod intent;
pub mod language;
pub mod pool;
pub mod sampling;
pub mod seq2seq;
pub mod translate;

pub use cell::{ModelCell, ModelFamily, ModelLoader};
pub use config::ModelSpec;
pub use error::{ModelError, Result};
pub use intent::{BertIntentClassifier, BertIntentLoader, IntentPrediction, IntentService, SequenceClassifier, INTENT_LABELS};
pub use language::{DetectedLanguage, LanguageDetector};
pub use pool::InferencePool;
pub use sampling::SamplingParams;
pub use seq2seq::{Seq2SeqLoader, Seq2SeqModel, TextGenerator};
pub use translate::{TranslationService, Translator};
