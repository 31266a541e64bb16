//! OpenAI-compatible client against a mock completion server.

use std::sync::Arc;
use std::time::Duration;

use gateway_sdk::{GatewayClient, GatewayFrame};
use serde_json::{json, Value};

use chat_gateway::backend::{BackendError, ChatBackend, OpenAiBackend, WorkerPool};
use chat_gateway::config::OpenAiConfig;
use chat_gateway::protocol::ChatTurn;

mod common;
use common::{completion_body, gateway_config, start_completion_backend, start_gateway, ws_url};

fn openai_config(addr: std::net::SocketAddr, timeout: u64) -> OpenAiConfig {
    OpenAiConfig {
        model: "test-model".into(),
        base_url: format!("http://{}/v1", addr),
        api_key: "sk-test".into(),
        timeout,
    }
}

async fn complete(backend: Arc<OpenAiBackend>, turns: Vec<ChatTurn>) -> Result<String, BackendError> {
    WorkerPool::new(1)
        .run(move || backend.complete(&turns))
        .await
        .unwrap()
}

fn request_body(raw: &str) -> Value {
    let body = raw.split("\r\n\r\n").nth(1).unwrap();
    serde_json::from_str(body).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_returns_first_choice_and_sends_model_and_turns() {
    let (addr, mut requests) =
        start_completion_backend(|| async { (200, completion_body("hello from upstream")) }).await;
    let backend = Arc::new(OpenAiBackend::new(&openai_config(addr, 5)).unwrap());

    let turns = vec![
        ChatTurn {
            role: "system".into(),
            content: "be brief".into(),
        },
        ChatTurn::user("hi"),
    ];
    let text = complete(backend, turns).await.unwrap();
    assert_eq!(text, "hello from upstream");

    let raw = requests.recv().await.unwrap();
    assert!(raw.starts_with("POST /v1/chat/completions"));
    assert!(raw.to_ascii_lowercase().contains("authorization: bearer sk-test"));
    assert_eq!(
        request_body(&raw),
        json!({
            "model": "test-model",
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"}
            ]
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_choices_yield_empty_text() {
    let (addr, _requests) =
        start_completion_backend(|| async { (200, r#"{"choices":[]}"#.to_string()) }).await;
    let backend = Arc::new(OpenAiBackend::new(&openai_config(addr, 5)).unwrap());

    let text = complete(backend, vec![ChatTurn::user("hi")]).await.unwrap();
    assert_eq!(text, "");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_status_carries_upstream_detail() {
    let (addr, _requests) = start_completion_backend(|| async {
        (500, r#"{"error":{"message":"model overloaded"}}"#.to_string())
    })
    .await;
    let backend = Arc::new(OpenAiBackend::new(&openai_config(addr, 5)).unwrap());

    match complete(backend, vec![ChatTurn::user("hi")]).await {
        Err(BackendError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("model overloaded"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slow_upstream_times_out() {
    let (addr, _requests) = start_completion_backend(|| async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (200, completion_body("too late"))
    })
    .await;
    let backend = Arc::new(OpenAiBackend::new(&openai_config(addr, 1)).unwrap());

    let err = complete(backend, vec![ChatTurn::user("hi")]).await.unwrap_err();
    assert!(matches!(err, BackendError::Timeout(1)), "{err:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_upstream_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = Arc::new(OpenAiBackend::new(&openai_config(addr, 5)).unwrap());
    let err = complete(backend, vec![ChatTurn::user("hi")]).await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)), "{err:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_gateway_relays_upstream_reply_end_to_end() {
    let (upstream, mut requests) =
        start_completion_backend(|| async { (200, completion_body("你好")) }).await;
    let backend = Arc::new(OpenAiBackend::new(&openai_config(upstream, 5)).unwrap());
    let (addr, _shutdown) = start_gateway(gateway_config(true, &["esp32"]), backend).await;

    let mut client = GatewayClient::connect(&ws_url(addr), Some("esp32")).await.unwrap();
    let frame = client.ask("hello", Some("req-1")).await.unwrap();
    assert_eq!(
        frame,
        GatewayFrame::Response {
            device_id: Some("esp32".into()),
            content: "你好".into(),
            request_id: Some(json!("req-1")),
        }
    );

    let raw = requests.recv().await.unwrap();
    assert_eq!(
        request_body(&raw)["messages"],
        json!([{"role": "user", "content": "hello"}])
    );
}
