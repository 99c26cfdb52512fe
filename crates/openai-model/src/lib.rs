//! A model provider for OpenAI-compatible chat completion APIs, which
//! covers both OpenAI and OpenRouter.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use llm_chat_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use mime::Mime;
use reqwest::{Client, RequestBuilder, Response, header};

pub use config::{
    OPENAI_BASE_URL, OPENROUTER_BASE_URL, OpenAIConfig, OpenAIConfigBuilder,
};
use io::{Chunks, Sse};
use proto::{ChatCompletion, ErrorEnvelope, ModelList};
pub use response::OpenAIResponse;

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::new(format!("{err}"), ErrorKind::Transport)
    }
}

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let mut builder = builder.header(
            header::AUTHORIZATION,
            format!("Bearer {}", self.config.api_key),
        );
        for (name, value) in &self.config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;
    type Response = OpenAIResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let stream = self.config.stream;
        let openai_req = proto::create_request(req, stream);
        let accept = if stream {
            "text/event-stream"
        } else {
            "application/json"
        };
        debug!(
            "sending chat completion request for model {} ({} messages)",
            req.model,
            req.messages.len()
        );
        let resp_fut = self
            .authorized(
                self.client.post(self.config.endpoint("/chat/completions")),
            )
            .header(header::ACCEPT, accept)
            .json(&openai_req)
            .send();

        async move {
            let resp = check_status(resp_fut.await?).await?;

            let is_event_stream = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<Mime>().ok())
                .is_some_and(|m| m.essence_str() == "text/event-stream");
            if is_event_stream {
                let sse = Sse::new(Chunks::from(resp));
                return Ok(OpenAIResponse::from_sse(sse));
            }

            let body = resp.bytes().await?;
            let completion: ChatCompletion = serde_json::from_slice(&body)
                .map_err(|err| {
                    Error::new(
                        format!("unexpected completion body: {err}"),
                        ErrorKind::InvalidResponse,
                    )
                })?;
            OpenAIResponse::from_completion(completion)
        }
    }

    fn list_models(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'static
    {
        let resp_fut = self
            .authorized(self.client.get(self.config.endpoint("/models")))
            .send();

        async move {
            let resp = check_status(resp_fut.await?).await?;
            let body = resp.bytes().await?;
            let list: ModelList = serde_json::from_slice(&body).map_err(|err| {
                Error::new(
                    format!("unexpected model list: {err}"),
                    ErrorKind::InvalidResponse,
                )
            })?;
            Ok(list.data.into_iter().map(|entry| entry.id).collect())
        }
    }
}

/// Turns a non-success response into an [`Error`], preferring the message
/// of the JSON error envelope when the server sent one.
async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_owned());
    warn!("server responded with {status}: {message}");

    let message = if message.is_empty() {
        format!("server responded with {status}")
    } else {
        format!("{message} ({status})")
    };
    Err(Error::new(message, ErrorKind::from_status(status.as_u16())))
}
