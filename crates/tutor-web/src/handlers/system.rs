//! Health, supported languages and service status.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tutor_common::Language;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
}

/// GET / - liveness check
pub async fn root() -> Json<Health> {
    Json(Health { status: "ok", message: "Tutor API is running" })
}

#[derive(Debug, Serialize)]
pub struct SupportedLanguages {
    pub supported_languages: Vec<&'static str>,
    pub language_codes: BTreeMap<&'static str, &'static str>,
}

/// GET /supported-languages
pub async fn supported_languages() -> Json<SupportedLanguages> {
    Json(SupportedLanguages {
        supported_languages: Language::ALL.iter().map(Language::name).collect(),
        language_codes: Language::ALL.iter().map(|l| (l.code(), l.model_code())).collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct RemoteStatus {
    pub available: bool,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LocalModelStatus {
    pub generation: bool,
    pub translation: bool,
    pub intent: bool,
}

#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
    pub remote: RemoteStatus,
    pub providers: Vec<String>,
    pub local_models: LocalModelStatus,
    pub workers: usize,
    pub idle_workers: usize,
}

/// GET /status - provider availability and which local models are loaded
pub async fn status(State(state): State<SharedState>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "ok",
        remote: RemoteStatus {
            available: state.providers.is_available(),
            model: state.providers.model().map(str::to_string),
        },
        providers: state.generator.chain().names(),
        local_models: LocalModelStatus {
            generation: state.generator.local_model_loaded(),
            translation: state.translator.is_loaded(),
            intent: state.intents.is_loaded(),
        },
        workers: state.pool.workers(),
        idle_workers: state.pool.available(),
    })
}
