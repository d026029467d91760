//! Prompt shaping: task templates, complexity tiers and token budgets.
//!
//! Every request is shaped once, before dispatch. The shaped prompt carries
//! two renderings of the same instruction: a verbose one for chat-style
//! remote models and a terse one for small local seq2seq models.

use serde::Serialize;
use tutor_common::entities::{DEFAULT_NUM_QUESTIONS, DEFAULT_TEMPERATURE};
use tutor_common::{GenerationRequest, TaskKind};

/// Inputs with at least this many words are treated as complex.
pub const COMPLEX_WORD_THRESHOLD: usize = 100;

/// Output token cap for simple inputs, regardless of task.
pub const SIMPLE_TOKEN_CAP: u32 = 1024;

/// Output token cap for complex inputs, regardless of task.
pub const COMPLEX_TOKEN_CAP: u32 = 512;

pub const MAX_TEMPERATURE: f32 = 2.0;
pub const MAX_QUESTIONS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Complex,
}

/// Which rendering of the prompt a backend consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    Chat,
    Seq2Seq,
}

pub fn complexity(text: &str) -> Complexity {
    if text.split_whitespace().count() >= COMPLEX_WORD_THRESHOLD {
        Complexity::Complex
    } else {
        Complexity::Simple
    }
}

/// Output token budget for a task. The task ceiling is an outer bound and
/// never raises the tier cap. Never below 1.
pub fn token_budget(task: TaskKind, complexity: Complexity, requested: u32) -> u32 {
    let tier_cap = match complexity {
        Complexity::Complex => COMPLEX_TOKEN_CAP,
        Complexity::Simple => SIMPLE_TOKEN_CAP,
    };
    requested.min(task.token_ceiling()).min(tier_cap).max(1)
}

/// Clamp into [0, 2]; NaN becomes the default temperature.
pub fn clamp_temperature(temperature: f32) -> f32 {
    if temperature.is_nan() {
        return DEFAULT_TEMPERATURE;
    }
    temperature.clamp(0.0, MAX_TEMPERATURE)
}

pub fn clamp_questions(requested: Option<u32>) -> u32 {
    requested.unwrap_or(DEFAULT_NUM_QUESTIONS).clamp(1, MAX_QUESTIONS)
}

/// A request after shaping, ready for any backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedPrompt {
    pub task: TaskKind,
    pub chat: String,
    pub seq2seq: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub complexity: Complexity,
}

impl ShapedPrompt {
    pub fn text_for(&self, style: PromptStyle) -> &str {
        match style {
            PromptStyle::Chat => &self.chat,
            PromptStyle::Seq2Seq => &self.seq2seq,
        }
    }
}

pub fn shape(req: &GenerationRequest) -> ShapedPrompt {
    let text = req.text.trim();
    let tier = complexity(text);

    let (chat, seq2seq) = match req.task {
        TaskKind::Answer => (text.to_string(), text.to_string()),
        TaskKind::Notes => (chat_notes(text), seq2seq_notes(text)),
        TaskKind::Quiz => {
            let n = clamp_questions(req.num_questions);
            (chat_quiz(text, n), seq2seq_quiz(text, n))
        }
    };

    ShapedPrompt {
        task: req.task,
        chat,
        seq2seq,
        max_tokens: token_budget(req.task, tier, req.max_tokens),
        temperature: clamp_temperature(req.temperature),
        complexity: tier,
    }
}

fn chat_notes(text: &str) -> String {
    format!(
        "Generate comprehensive and well-structured study notes for the following topic:\n\
         \n\
         {text}\n\
         \n\
         Please provide:\n\
         1. Key concepts and definitions\n\
         2. Important points to remember\n\
         3. Examples and applications\n\
         4. Summary\n\
         \n\
         Format the notes clearly with sections and bullet points."
    )
}

fn seq2seq_notes(text: &str) -> String {
    format!("Summarize the following text into concise study notes:\n\n{text}")
}

fn chat_quiz(text: &str, n: u32) -> String {
    format!(
        "Generate {n} multiple-choice questions based on the following topic:\n\
         \n\
         {text}\n\
         \n\
         For each question, provide:\n\
         1. The question\n\
         2. Four options (A, B, C, D)\n\
         3. The correct answer (mark with [CORRECT])\n\
         4. A brief explanation\n\
         \n\
         Format each question clearly with Q: prefix and options with A), B), C), D) prefixes."
    )
}

fn seq2seq_quiz(text: &str, n: u32) -> String {
    format!(
        "Generate {n} multiple-choice questions with answers based on the following text. \
         Format each question with 'Q:' and options as 'A)', 'B)', etc. \
         with the correct answer marked with [CORRECT]:\n\n{text}"
    )
}
