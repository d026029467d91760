//! Language detection, intent classification and translation endpoints.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use tutor_models::{DetectedLanguage, IntentPrediction};

use crate::error::{with_deadline, ApiError};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub target_lang: String,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
}

fn default_source_lang() -> String { "en".to_string() }

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// POST /detect-language
pub async fn detect_language(
    State(state): State<SharedState>,
    Json(req): Json<TextRequest>,
) -> Json<DetectedLanguage> {
    Json(state.detector.detect(&req.text))
}

/// POST /classify-intent
pub async fn classify_intent(
    State(state): State<SharedState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<IntentPrediction>, ApiError> {
    let prediction = with_deadline(state.request_timeout, async {
        state.intents.classify(&req.text).await.map_err(ApiError::from)
    })
    .await?;
    Ok(Json(prediction))
}

/// POST /translate - 400 on unsupported language codes
pub async fn translate(
    State(state): State<SharedState>,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    info!(source = %req.source_lang, target = %req.target_lang, chars = req.text.len(), "Translate request");
    let translated_text = with_deadline(state.request_timeout, async {
        state
            .translator
            .translate(&req.text, &req.source_lang, &req.target_lang)
            .await
            .map_err(ApiError::from)
    })
    .await?;

    Ok(Json(TranslateResponse {
        translated_text,
        source_lang: req.source_lang,
        target_lang: req.target_lang,
    }))
}
