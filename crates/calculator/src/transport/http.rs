use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use tokio::net::TcpListener;

use crate::rpc::Dispatcher;

/// The address the HTTP transport listens on by default.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
/// The port the HTTP transport listens on by default.
pub const DEFAULT_PORT: u16 = 8050;

/// Routes `POST /mcp` to `dispatcher`. Each request body is one message.
pub fn router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .route("/mcp", post(handle_message))
        .with_state(dispatcher)
}

async fn handle_message(
    State(dispatcher): State<Dispatcher>,
    body: String,
) -> Response {
    match dispatcher.handle_text(&body).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Serves `dispatcher` over HTTP on `addr` until interrupted.
pub async fn serve_http(
    dispatcher: Dispatcher,
    addr: SocketAddr,
) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("listening on http://{}/mcp", listener.local_addr()?);
    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("interrupted, shutting down");
        })
        .await
}
