use std::net::SocketAddr;

use llm_chat_calculator::{Dispatcher, tools, transport};
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = transport::router(Dispatcher::new(tools::catalog()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_call_over_http() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/mcp");

    let reply: Value = client
        .post(&url)
        .json(&json!({
            "jsonrpc": "2.0",
            "id": "a",
            "method": "tools/call",
            "params": { "name": "factorial", "arguments": { "a": 6 } },
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["id"], "a");
    assert_eq!(reply["result"]["structuredContent"]["result"], 720);

    let reply: Value = client
        .post(&url)
        .json(&json!({
            "jsonrpc": "2.0",
            "id": "b",
            "method": "tools/call",
            "params": { "name": "divide", "arguments": { "a": 1, "b": 0 } },
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["result"]["isError"], true);
    assert_eq!(reply["result"]["content"][0]["text"], "Cannot divide by zero");
}

#[tokio::test]
async fn test_notification_is_accepted() {
    let addr = spawn_server().await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/mcp"))
        .json(&json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);
    assert!(resp.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body() {
    let addr = spawn_server().await;
    let reply: Value = reqwest::Client::new()
        .post(format!("http://{addr}/mcp"))
        .body("not json")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["error"]["code"], -32700);
}
