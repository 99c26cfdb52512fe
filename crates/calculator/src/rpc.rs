//! JSON-RPC 2.0 dispatch for the tool protocol.
//!
//! A message without an `id` is a notification and gets no reply. Every
//! other message gets exactly one reply, carrying either a `result` or an
//! `error`.

use std::fmt::{self, Display};
use std::sync::Arc;

use llm_chat_core::tool::{Catalog, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The protocol revision answered when the client doesn't ask for one.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// The name the server introduces itself with.
pub const SERVER_NAME: &str = "Calculator";

/// Standard JSON-RPC error codes.
pub mod code {
    /// The message is not valid JSON.
    pub const PARSE_ERROR: i64 = -32700;
    /// The message is JSON but not a request object.
    pub const INVALID_REQUEST: i64 = -32600;
    /// No such method.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// The method exists but the params don't fit it.
    pub const INVALID_PARAMS: i64 = -32602;
}

/// The `error` member of a failed reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RpcError {
    /// One of the [`code`] constants.
    pub code: i64,
    /// Human-readable description.
    pub message: String,
}

impl RpcError {
    fn new<S: Into<String>>(code: i64, message: S) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

#[derive(Deserialize)]
struct Request {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Deserialize)]
struct CallParams {
    name: String,
    #[serde(default = "empty_object")]
    arguments: Value,
}

fn empty_object() -> Value {
    json!({})
}

/// Routes requests to the tool catalog. Cloning is cheap and every clone
/// shares the catalog.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    catalog: Arc<Catalog>,
}

impl Dispatcher {
    /// Creates a dispatcher serving the tools in `catalog`.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Handles one raw message, including text that isn't JSON at all.
    pub async fn handle_text(&self, text: &str) -> Option<Value> {
        match serde_json::from_str(text) {
            Ok(message) => self.handle(message).await,
            Err(err) => {
                debug!("unparsable message: {err}");
                Some(parse_error(err))
            }
        }
    }

    /// Handles one decoded message. Returns `None` for notifications.
    pub async fn handle(&self, message: Value) -> Option<Value> {
        let id = message.get("id").cloned().unwrap_or(Value::Null);
        let request: Request = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(err) => {
                let err = RpcError::new(
                    code::INVALID_REQUEST,
                    format!("Invalid request: {err}"),
                );
                return Some(failure(id, err));
            }
        };
        if request.jsonrpc != "2.0" {
            let err = RpcError::new(
                code::INVALID_REQUEST,
                "Invalid request: jsonrpc must be \"2.0\"",
            );
            return Some(failure(id, err));
        }

        let Some(id) = request.id else {
            self.notify(&request.method);
            return None;
        };
        debug!("request {id}: {}", request.method);
        let reply = match self.dispatch(&request.method, request.params).await
        {
            Ok(result) => {
                json!({ "jsonrpc": "2.0", "id": id, "result": result })
            }
            Err(err) => {
                debug!("request {id} failed: {err}");
                failure(id, err)
            }
        };
        Some(reply)
    }

    fn notify(&self, method: &str) {
        match method {
            "notifications/initialized" => info!("client initialized"),
            _ => trace!("ignoring notification {method}"),
        }
    }

    async fn dispatch(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(initialize(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => {
                Ok(json!({ "tools": self.catalog.definitions() }))
            }
            "tools/call" => self.call_tool(params).await,
            _ => Err(RpcError::new(
                code::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            )),
        }
    }

    async fn call_tool(&self, params: Value) -> Result<Value, RpcError> {
        let CallParams { name, arguments } = serde_json::from_value(params)
            .map_err(|err| {
                RpcError::new(
                    code::INVALID_PARAMS,
                    format!("Invalid params: {err}"),
                )
            })?;

        // Rejected calls are still successful replies, flagged with
        // `isError` so the caller's model can read the reason.
        let result = match self.catalog.call(&name, arguments).await {
            Ok(value) => json!({
                "content": [{ "type": "text", "text": value.to_string() }],
                "structuredContent": { "result": value },
                "isError": false,
            }),
            Err(err) => {
                // An unknown name is a protocol error, not a tool failure.
                if err.kind() == ErrorKind::NotFound {
                    return Err(RpcError::new(
                        code::INVALID_PARAMS,
                        err.reason(),
                    ));
                }
                info!("tool {name} rejected the call: {err}");
                json!({
                    "content": [{ "type": "text", "text": err.reason() }],
                    "isError": true,
                })
            }
        };
        Ok(result)
    }
}

/// The reply to a message that couldn't be decoded. Its `id` is null
/// since the request's own `id` is unreadable.
pub fn parse_error<E: Display>(err: E) -> Value {
    let err = RpcError::new(code::PARSE_ERROR, format!("Parse error: {err}"));
    failure(Value::Null, err)
}

fn initialize(params: &Value) -> Value {
    let version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION);
    json!({
        "protocolVersion": version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

fn failure(id: Value, err: RpcError) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": err })
}
