use std::future::poll_fn;
use std::pin::pin;
use std::sync::{Arc, Mutex};

use axum::{Json, Router};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use llm_chat_model::{
    ErrorKind, ModelMessage, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent, SamplingParameters,
};
use llm_chat_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const STREAM_BODY: &str = include_str!("../fixtures/test_response.txt");

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn chat_completions(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    captured.auth.lock().unwrap().push(auth.clone());
    let stream = body["stream"].as_bool().unwrap_or(false);
    captured.bodies.lock().unwrap().push(body);

    if auth != "Bearer sk-test" {
        let error =
            json!({ "error": { "message": "Incorrect API key provided" } });
        return (StatusCode::UNAUTHORIZED, Json(error)).into_response();
    }
    if stream {
        return ([(header::CONTENT_TYPE, "text/event-stream")], STREAM_BODY)
            .into_response();
    }
    Json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": "Hi! How are you?" },
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

async fn models() -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [
            { "id": "gpt-4o", "object": "model" },
            { "id": "gpt-3.5-turbo", "object": "model" }
        ]
    }))
}

async fn serve() -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/models", get(models))
        .with_state(captured.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1"), captured)
}

fn request(text: &str) -> ModelRequest {
    ModelRequest {
        model: "gpt-3.5-turbo".to_owned(),
        messages: vec![
            ModelMessage::System("You are a helpful AI assistant.".to_owned()),
            ModelMessage::User(text.to_owned()),
        ],
        sampling: SamplingParameters::with_temperature(0.5),
    }
}

async fn collect<R: ModelResponse>(resp: R) -> Result<String, R::Error> {
    let mut resp = pin!(resp);
    let mut text = String::new();
    while let Some(event) =
        poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
    {
        if let ModelResponseEvent::MessageDelta(delta) = event {
            text.push_str(&delta);
        }
    }
    Ok(text)
}

#[tokio::test]
async fn test_complete_reply() {
    let (base_url, captured) = serve().await;
    let provider = OpenAIProvider::new(
        OpenAIConfigBuilder::with_api_key("sk-test")
            .with_base_url(base_url)
            .build(),
    );

    let resp = provider.send_request(&request("Hello")).await.unwrap();
    assert_eq!(collect(resp).await.unwrap(), "Hi! How are you?");

    let bodies = captured.bodies.lock().unwrap();
    assert_eq!(bodies[0]["model"], "gpt-3.5-turbo");
    assert_eq!(bodies[0]["temperature"], 0.5);
    assert_eq!(bodies[0]["messages"][1]["role"], "user");
    assert_eq!(bodies[0]["messages"][1]["content"], "Hello");
}

#[tokio::test]
async fn test_streamed_reply() {
    let (base_url, _captured) = serve().await;
    let provider = OpenAIProvider::new(
        OpenAIConfigBuilder::with_api_key("sk-test")
            .with_base_url(base_url)
            .with_stream(true)
            .with_header("X-Title", "llm-chat")
            .build(),
    );

    let resp = provider.send_request(&request("Hello")).await.unwrap();
    assert_eq!(
        collect(resp).await.unwrap(),
        "Hello! How can I help you today?"
    );
}

#[tokio::test]
async fn test_rejected_key() {
    let (base_url, captured) = serve().await;
    let provider = OpenAIProvider::new(
        OpenAIConfigBuilder::with_api_key("sk-wrong")
            .with_base_url(base_url)
            .build(),
    );

    let err = provider.send_request(&request("Hello")).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(err.message().contains("Incorrect API key provided"));
    assert_eq!(captured.auth.lock().unwrap()[0], "Bearer sk-wrong");
}

#[tokio::test]
async fn test_list_models() {
    let (base_url, _captured) = serve().await;
    let provider = OpenAIProvider::new(
        OpenAIConfigBuilder::with_api_key("sk-test")
            .with_base_url(base_url)
            .build(),
    );
    assert_eq!(
        provider.list_models().await.unwrap(),
        ["gpt-4o", "gpt-3.5-turbo"]
    );
}

#[tokio::test]
async fn test_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider = OpenAIProvider::new(
        OpenAIConfigBuilder::with_api_key("sk-test")
            .with_base_url(format!("http://{addr}/v1"))
            .build(),
    );
    let err = provider.send_request(&request("Hello")).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
