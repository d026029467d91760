//! Axum router — maps all URL paths to handlers.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::cors::{cors_layer, preflight};
use crate::handlers::{
    generation::{generate_answer, generate_notes, generate_quiz},
    language::{classify_intent, detect_language, translate},
    system::{root, status, supported_languages},
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let origins = state.origins.clone();
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/",                    get(root))
        .route("/status",              get(status))
        .route("/supported-languages", get(supported_languages))

        // Language services
        .route("/detect-language",     post(detect_language))
        .route("/classify-intent",     post(classify_intent))
        .route("/translate",           post(translate))

        // Generation
        .route("/generate-answer",     post(generate_answer))
        .route("/generate-notes",      post(generate_notes))
        .route("/generate-quiz",       post(generate_quiz))

        // Middleware
        .layer(cors_layer(&origins))
        .layer(middleware::from_fn_with_state(origins, preflight))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
