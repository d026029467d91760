//! API error type rendered as `{"detail": "..."}`.

use std::future::Future;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;
use tutor_models::ModelError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        if e.is_invalid_argument() {
            ApiError::InvalidArgument(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Run `fut` under the request deadline.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ApiError::Timeout(limit.as_secs()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_common::UnsupportedLanguage;

    #[test]
    fn test_unsupported_language_is_bad_request() {
        let e: ApiError = ModelError::from(UnsupportedLanguage {
            source_lang: "en".to_string(),
            target_lang: "xx".to_string(),
        })
        .into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert!(e.to_string().contains("xx"));
    }

    #[test]
    fn test_model_failure_is_internal() {
        let e: ApiError = ModelError::Inference("shape mismatch".to_string()).into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_deadline_elapsed() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, ApiError>(())
        };
        let err = with_deadline(Duration::from_millis(10), slow).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_deadline_passes_result_through() {
        let value = with_deadline(Duration::from_secs(1), async { Ok::<_, ApiError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
