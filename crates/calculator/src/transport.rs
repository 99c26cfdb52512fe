//! The two ways a client can reach the [`Dispatcher`](crate::rpc::Dispatcher).

mod http;
mod stdio;

pub use http::{DEFAULT_HOST, DEFAULT_PORT, router, serve_http};
pub use stdio::serve_stdio;
