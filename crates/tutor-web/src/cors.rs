//! Cross-origin handling.
//!
//! Actual requests get their headers from `CorsLayer`. Every `OPTIONS`
//! request is answered directly by [`preflight`] so that preflights succeed
//! even when a proxy strips the headers `CorsLayer` needs to recognize them.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::debug;
use tutor_config::OriginPolicy;

pub const ALLOW_METHODS: &str = "GET,POST,OPTIONS";
pub const ALLOW_HEADERS: &str = "Authorization,Content-Type,Accept";

/// Origin echoed back on a preflight.
///
/// Under a wildcard policy the request origin is mirrored (or `*` if the
/// request has none). Otherwise a listed origin is echoed and anything else
/// gets the first configured origin.
pub fn resolve_allow_origin(policy: &OriginPolicy, request_origin: Option<&str>) -> String {
    match policy {
        OriginPolicy::Any => request_origin.unwrap_or("*").to_string(),
        OriginPolicy::List(origins) => match request_origin {
            Some(origin) if origins.iter().any(|o| o == origin) => origin.to_string(),
            _ => origins.first().cloned().unwrap_or_else(|| "*".to_string()),
        },
    }
}

pub fn cors_layer(policy: &OriginPolicy) -> CorsLayer {
    let allow_origin = match policy {
        OriginPolicy::Any => AllowOrigin::mirror_request(),
        OriginPolicy::List(origins) => AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Answer every `OPTIONS` request with a 200 preflight response.
pub async fn preflight(State(policy): State<OriginPolicy>, req: Request, next: Next) -> Response {
    if req.method() != Method::OPTIONS {
        return next.run(req).await;
    }

    let origin = req
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());
    let allow_origin = resolve_allow_origin(&policy, origin);
    debug!(path = %req.uri().path(), allow_origin = %allow_origin, "Preflight");

    let mut resp = Response::new(Body::empty());
    *resp.status_mut() = StatusCode::OK;
    let headers = resp.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&allow_origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    headers.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    resp
}
