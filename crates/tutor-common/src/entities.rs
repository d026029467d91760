//! Core request/result types shared by the dispatch layer and the HTTP surface.

use serde::{Deserialize, Serialize};

use crate::confidence::DEGRADED_PLACEHOLDER;

// ---------------------------------------------------------------------------
// Task kind
// ---------------------------------------------------------------------------

/// Generation task requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Answer,
    Notes,
    Quiz,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Answer => "answer",
            TaskKind::Notes  => "notes",
            TaskKind::Quiz   => "quiz",
        }
    }

    /// Outer token bound for the task. The complexity tier caps it further.
    pub fn token_ceiling(&self) -> u32 {
        match self {
            TaskKind::Answer => 1024,
            TaskKind::Notes  => 1024,
            TaskKind::Quiz   => 2048,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_NUM_QUESTIONS: u32 = 5;

/// One generation call. Built per incoming request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Raw prompt (answer) or subject text (notes, quiz).
    pub text: String,
    pub task: TaskKind,
    pub max_tokens: u32,
    pub temperature: f32,
    pub num_questions: Option<u32>,
}

impl GenerationRequest {
    pub fn answer(prompt: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            text: prompt.into(),
            task: TaskKind::Answer,
            max_tokens,
            temperature,
            num_questions: None,
        }
    }

    pub fn notes(text: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            text: text.into(),
            task: TaskKind::Notes,
            max_tokens,
            temperature,
            num_questions: None,
        }
    }

    pub fn quiz(text: impl Into<String>, num_questions: u32, max_tokens: u32, temperature: f32) -> Self {
        Self {
            text: text.into(),
            task: TaskKind::Quiz,
            max_tokens,
            temperature,
            num_questions: Some(num_questions),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// A single generated text with its (synthetic) confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub score: f32,
}

impl Candidate {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self { text: text.into(), score: score.clamp(0.0, 1.0) }
    }
}

/// Ordered candidates (first = highest confidence) plus how they were produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub candidates: Vec<Candidate>,
    /// Backend that produced the candidates; `None` when nothing ran.
    pub provider: Option<String>,
    /// True when every provider failed and `candidates` holds the placeholder.
    pub degraded: bool,
    pub error: Option<String>,
}

impl GenerationResult {
    pub fn from_provider(provider: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            provider: Some(provider.into()),
            degraded: false,
            error: None,
        }
    }

    /// Blank input short-circuits to a single empty candidate.
    pub fn blank() -> Self {
        Self {
            candidates: vec![Candidate::new("", 0.0)],
            provider: None,
            degraded: false,
            error: None,
        }
    }

    /// Placeholder returned when no provider could produce text.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate::new(DEGRADED_PLACEHOLDER, 0.0)],
            provider: None,
            degraded: true,
            error: Some(reason.into()),
        }
    }

    pub fn first_text(&self) -> Option<&str> {
        self.candidates.first().map(|c| c.text.as_str())
    }
}
