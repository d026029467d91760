//! tutor-common — Shared types used across all tutor crates.

pub mod entities;
pub mod confidence;
pub mod language;

// Re-export commonly used types
pub use entities::{Candidate, GenerationRequest, GenerationResult, TaskKind};
pub use language::{Language, UnsupportedLanguage};
