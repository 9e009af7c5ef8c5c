//! Local Model Client Tests
//!
//! Uses wiremock for the OpenAI-compatible endpoints:
//! - Health probes (up, down, unreachable, timeout)
//! - Chat request body and bearer auth
//! - Response parsing and API errors
//! - Registry scan bookkeeping

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::llm::local_models::EMPTY_RESPONSE;
use crate::core::llm::{ChatMessage, LocalModel, LocalModelClient, LocalModelError, LocalModelRegistry};

const CHAT_PATH: &str = "/v1/chat/completions";
const HEALTH_PATH: &str = "/v1/chat/completions/health";

fn model_at(id: &str, base: &str) -> LocalModel {
    LocalModel {
        id: id.to_string(),
        name: format!("{id} model"),
        description: String::new(),
        provider: "test".to_string(),
        model_size: None,
        capabilities: Vec::new(),
        available: false,
        language: None,
        endpoint: Some(format!("{base}{CHAT_PATH}")),
        api_key: None,
    }
}

fn client() -> LocalModelClient {
    LocalModelClient::new(Duration::from_millis(500)).unwrap()
}

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

// =============================================================================
// Health Probes
// =============================================================================

#[tokio::test]
async fn test_health_ok_means_available() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client().check_availability(&model_at("qwen-7b", &server.uri())).await);
}

#[tokio::test]
async fn test_health_error_status_means_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(!client().check_availability(&model_at("qwen-7b", &server.uri())).await);
}

#[tokio::test]
async fn test_health_timeout_means_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = LocalModelClient::new(Duration::from_millis(100)).unwrap();
    assert!(!client.check_availability(&model_at("slow", &server.uri())).await);
}

#[tokio::test]
async fn test_missing_endpoint_is_never_available() {
    let mut model = model_at("nowhere", "http://127.0.0.1:9");
    model.endpoint = None;

    assert!(!client().check_availability(&model).await);
    let err = client().send_message(&model, &[ChatMessage::user("hi")]).await.unwrap_err();
    assert!(matches!(err, LocalModelError::NoEndpoint(_)));
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_send_message_body_and_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "model": "qwen-7b",
            "messages": [
                { "role": "system", "content": "你是一位老师" },
                { "role": "user", "content": "什么是勾股定理？" }
            ],
            "max_tokens": 2000,
            "stream": false
        })))
        .respond_with(chat_reply("直角三角形两直角边的平方和等于斜边的平方"))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client()
        .send_message(
            &model_at("qwen-7b", &server.uri()),
            &[ChatMessage::system("你是一位老师"), ChatMessage::user("什么是勾股定理？")],
        )
        .await
        .unwrap();

    assert_eq!(reply, "直角三角形两直角边的平方和等于斜边的平方");
}

#[tokio::test]
async fn test_send_message_uses_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", "Bearer sk-local"))
        .respond_with(chat_reply("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut model = model_at("chatglm3-6b", &server.uri());
    model.api_key = Some("sk-local".to_string());

    let reply = client().send_message(&model, &[ChatMessage::user("hi")]).await.unwrap();
    assert_eq!(reply, "ok");
}

#[tokio::test]
async fn test_empty_choices_yield_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let reply = client()
        .send_message(&model_at("baichuan2-7b", &server.uri()), &[ChatMessage::user("hi")])
        .await
        .unwrap();

    assert_eq!(reply, EMPTY_RESPONSE);
}

#[tokio::test]
async fn test_error_status_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;

    let err = client()
        .send_message(&model_at("llama2-7b", &server.uri()), &[ChatMessage::user("hi")])
        .await
        .unwrap_err();

    match err {
        LocalModelError::ApiError { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "model crashed");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

// =============================================================================
// Registry
// =============================================================================

#[tokio::test]
async fn test_scan_marks_only_healthy_models() {
    let up = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&up)
        .await;
    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&down)
        .await;

    let mut registry = LocalModelRegistry::new(
        client(),
        vec![model_at("up", &up.uri()), model_at("down", &down.uri())],
    );
    assert!(registry.status().last_checked.is_none());

    let status = registry.scan().await;

    assert_eq!(status.total_models, 2);
    assert_eq!(status.available_models, 1);
    assert!(status.last_checked.is_some());
    assert!(registry.model("up").unwrap().available);
    assert!(!registry.model("down").unwrap().available);
}

#[tokio::test]
async fn test_registry_refuses_unavailable_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(chat_reply("should not be reached"))
        .expect(0)
        .mount(&server)
        .await;

    let registry = LocalModelRegistry::new(client(), vec![model_at("cold", &server.uri())]);
    let err = registry
        .send_message("cold", &[ChatMessage::user("hi")])
        .await
        .unwrap_err();

    assert!(matches!(err, LocalModelError::Unavailable(ref name) if name == "cold model"));
}

#[tokio::test]
async fn test_registry_rejects_unknown_model() {
    let registry = LocalModelRegistry::new(client(), Vec::new());
    let err = registry
        .send_message("gpt-5", &[ChatMessage::user("hi")])
        .await
        .unwrap_err();

    assert!(matches!(err, LocalModelError::UnknownModel(ref id) if id == "gpt-5"));
}

#[tokio::test]
async fn test_registry_forwards_after_scan() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(HEALTH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(chat_reply("你好！"))
        .mount(&server)
        .await;

    let mut registry = LocalModelRegistry::new(client(), vec![model_at("qwen-7b", &server.uri())]);
    registry.scan().await;

    let reply = registry
        .send_message("qwen-7b", &[ChatMessage::user("你好")])
        .await
        .unwrap();
    assert_eq!(reply, "你好！");
}
