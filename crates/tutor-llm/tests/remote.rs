//! GroqBackend against an in-process OpenAI-compatible mock server.

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{json, Value};
use tutor_common::GenerationRequest;
use tutor_config::RemoteConfig;
use tutor_llm::prompts::shape;
use tutor_llm::{GenerationBackend, GroqBackend, LlmError};
use pretty_assertions::assert_eq;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn backend(base_url: String) -> GroqBackend {
    let config = RemoteConfig { base_url, timeout_secs: 5, ..RemoteConfig::default() };
    GroqBackend::new(SecretString::from("gsk-test".to_string()), &config).unwrap()
}

async fn echo_completion(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer gsk-test");
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"message": "bad key"}})));
    }
    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default().to_string();
    let reply = json!({
        "model": body["model"],
        "choices": [{"message": {"role": "assistant", "content": format!("echo: {prompt}")}}],
        "usage": {"prompt_tokens": 7, "completion_tokens": body["max_tokens"]},
    });
    (StatusCode::OK, Json(reply))
}

#[tokio::test]
async fn test_completion_round_trip() {
    let base = serve(Router::new().route("/v1/chat/completions", post(echo_completion))).await;
    let groq = backend(base);

    let completion = groq.complete("What is gravity?", 64, 0.2).await.unwrap();
    assert_eq!(completion.content, "echo: What is gravity?");
    assert_eq!(completion.model, "llama-3.3-70b-versatile");
    assert_eq!(completion.usage.prompt_tokens, 7);
    assert_eq!(completion.usage.completion_tokens, 64);
}

#[tokio::test]
async fn test_generate_uses_chat_prompt() {
    let base = serve(Router::new().route("/v1/chat/completions", post(echo_completion))).await;
    let groq = backend(base);

    let prompt = shape(&GenerationRequest::notes("Magnetism", 300, 0.7));
    let candidates = groq.generate(&prompt).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].score, 0.95);
    assert!(candidates[0].text.starts_with("echo: Generate comprehensive and well-structured study notes"));
}

#[tokio::test]
async fn test_error_message_extracted() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": {"message": "model overloaded"}})))
        }),
    );
    let groq = backend(serve(router).await);

    match groq.complete("hi", 10, 0.7).await {
        Err(LlmError::ApiError { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "model overloaded");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let groq = backend(serve(router).await);
    assert!(matches!(groq.complete("hi", 10, 0.7).await, Err(LlmError::RateLimitExceeded)));
}

#[tokio::test]
async fn test_empty_choices_is_error() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({"model": "m", "choices": []})) }),
    );
    let groq = backend(serve(router).await);
    assert!(matches!(groq.complete("hi", 10, 0.7).await, Err(LlmError::EmptyResponse)));
}

#[tokio::test]
async fn test_unreachable_server_is_http_error() {
    let groq = backend("http://127.0.0.1:9".to_string());
    assert!(matches!(groq.complete("hi", 10, 0.7).await, Err(LlmError::Http(_))));
}
