use std::future::poll_fn;
use std::pin::pin;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use llm_chat_model::{
    ErrorKind, ModelMessage, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent, SamplingParameters,
};
use llm_chat_ollama_model::{OllamaConfigBuilder, OllamaProvider};
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
}

async fn chat(
    State(captured): State<Captured>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let model = body["model"].as_str().unwrap_or_default().to_owned();
    captured.bodies.lock().unwrap().push(body);
    if model != "llama2" {
        let error = json!({ "error": format!("model '{model}' not found") });
        return (StatusCode::NOT_FOUND, Json(error)).into_response();
    }
    Json(json!({
        "model": "llama2",
        "created_at": "2025-01-01T00:00:00Z",
        "message": {
            "role": "assistant",
            "content": "Why did the chicken cross the road?",
        },
        "done_reason": "stop",
        "done": true
    }))
    .into_response()
}

async fn tags() -> Json<Value> {
    Json(json!({
        "models": [
            { "name": "llama2:latest", "size": 3826793677u64 },
            { "name": "llama3.2:latest", "size": 2019393189u64 }
        ]
    }))
}

async fn serve() -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/api/chat", post(chat))
        .route("/api/tags", get(tags))
        .with_state(captured.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), captured)
}

fn request(model: &str) -> ModelRequest {
    ModelRequest {
        model: model.to_owned(),
        messages: vec![ModelMessage::User("Tell me a joke".to_owned())],
        sampling: SamplingParameters::default(),
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
async fn test_chat() {
    let (host, captured) = serve().await;
    let provider =
        OllamaProvider::new(OllamaConfigBuilder::new().with_host(host).build());

    assert!(provider.verify_connection().await);
    let resp = provider.send_request(&request("llama2")).await.unwrap();
    assert_eq!(
        collect(resp).await.unwrap(),
        "Why did the chicken cross the road?"
    );

    let bodies = captured.bodies.lock().unwrap();
    assert_eq!(bodies[0]["stream"], false);
    assert_eq!(bodies[0]["messages"][0]["content"], "Tell me a joke");
}

#[tokio::test]
async fn test_unknown_model() {
    let (host, _captured) = serve().await;
    let provider =
        OllamaProvider::new(OllamaConfigBuilder::new().with_host(host).build());

    let err = provider.send_request(&request("mistral")).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.message().contains("model 'mistral' not found"));
}

#[tokio::test]
async fn test_list_models() {
    let (host, _captured) = serve().await;
    let provider =
        OllamaProvider::new(OllamaConfigBuilder::new().with_host(host).build());
    assert_eq!(
        provider.list_models().await.unwrap(),
        ["llama2:latest", "llama3.2:latest"]
    );
}

#[tokio::test]
async fn test_server_not_running() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider = OllamaProvider::new(
        OllamaConfigBuilder::new()
            .with_host(format!("http://{addr}"))
            .build(),
    );
    assert!(!provider.verify_connection().await);
    let err = provider.send_request(&request("llama2")).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
