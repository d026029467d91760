//! Answer, notes and quiz generation endpoints.
//!
//! Provider failures never surface as HTTP errors: the response carries the
//! placeholder candidate with `degraded: true` instead.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tutor_common::entities::{DEFAULT_NUM_QUESTIONS, DEFAULT_TEMPERATURE};
use tutor_common::{Candidate, GenerationResult};
use tutor_llm::QuizQuestion;

use crate::error::{with_deadline, ApiError};
use crate::state::SharedState;

fn default_max_length()      -> u32 { 200 }
fn default_quiz_max_length() -> u32 { 500 }
fn default_temperature()     -> f32 { DEFAULT_TEMPERATURE }
fn default_num_questions()   -> u32 { DEFAULT_NUM_QUESTIONS }

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub prompt: String,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub text: String,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    pub text: String,
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
    #[serde(default = "default_quiz_max_length")]
    pub max_length: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub answers: Vec<Candidate>,
    pub provider: Option<String>,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<GenerationResult> for GenerationResponse {
    fn from(r: GenerationResult) -> Self {
        Self {
            answers: r.candidates,
            provider: r.provider,
            degraded: r.degraded,
            error: r.error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    #[serde(flatten)]
    pub generation: GenerationResponse,
    pub questions: Vec<QuizQuestion>,
}

/// POST /generate-answer
pub async fn generate_answer(
    State(state): State<SharedState>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let result = with_deadline(state.request_timeout, async {
        Ok::<_, ApiError>(state.generator.answer(&req.prompt, req.max_length, req.temperature).await)
    })
    .await?;
    Ok(Json(result.into()))
}

/// POST /generate-notes
pub async fn generate_notes(
    State(state): State<SharedState>,
    Json(req): Json<NotesRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let result = with_deadline(state.request_timeout, async {
        Ok::<_, ApiError>(state.generator.notes(&req.text, req.max_length, req.temperature).await)
    })
    .await?;
    Ok(Json(result.into()))
}

/// POST /generate-quiz
pub async fn generate_quiz(
    State(state): State<SharedState>,
    Json(req): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, ApiError> {
    let outcome = with_deadline(state.request_timeout, async {
        Ok::<_, ApiError>(state
            .generator
            .quiz(&req.text, req.num_questions, req.max_length, req.temperature)
            .await)
    })
    .await?;

    Ok(Json(QuizResponse {
        generation: outcome.result.into(),
        questions: outcome.questions,
    }))
}
