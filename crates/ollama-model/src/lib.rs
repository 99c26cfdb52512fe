//! A model provider for a local [Ollama](https://ollama.com) server.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use llm_chat_model::{
    CompleteResponse, ErrorKind, ModelFinishReason, ModelProvider,
    ModelProviderError, ModelRequest,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

pub use config::{OLLAMA_HOST, OllamaConfig, OllamaConfigBuilder};
use proto::{ChatResponse, ErrorBody, Tags};

/// Error type for [`OllamaProvider`].
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
        Self::new(
            format!("error communicating with Ollama: {err}"),
            ErrorKind::Transport,
        )
    }
}

/// The response of [`OllamaProvider`]. Requests are sent with streaming
/// disabled, so the whole reply arrives at once.
pub type OllamaResponse = CompleteResponse<Error>;

/// Ollama model provider.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: Client,
    config: Arc<OllamaConfig>,
}

impl OllamaProvider {
    /// Creates a new `OllamaProvider` with the given configuration.
    #[inline]
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Checks whether the server is reachable.
    pub async fn verify_connection(&self) -> bool {
        let result = self
            .client
            .get(self.config.endpoint("/api/tags"))
            .send()
            .await;
        match result {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                debug!("ollama at {} is unreachable: {err}", self.config.host);
                false
            }
        }
    }
}

impl ModelProvider for OllamaProvider {
    type Error = Error;
    type Response = OllamaResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let body = proto::create_request(req);
        debug!(
            "sending chat request for model {} ({} messages)",
            req.model,
            req.messages.len()
        );
        let resp_fut = self
            .client
            .post(self.config.endpoint("/api/chat"))
            .json(&body)
            .send();

        async move {
            let resp = check_status(resp_fut.await?).await?;
            let resp: ChatResponse = read_json(resp).await?;
            let Some(message) = resp.message else {
                return Err(Error::new(
                    "response has no message",
                    ErrorKind::InvalidResponse,
                ));
            };
            let reason = resp
                .done_reason
                .as_deref()
                .map(ModelFinishReason::from_provider_str)
                .unwrap_or(ModelFinishReason::Stop);
            Ok(CompleteResponse::from_text(message.content, reason))
        }
    }

    fn list_models(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'static
    {
        let url = self.config.endpoint("/api/tags");
        let resp_fut = self.client.get(url).send();

        async move {
            let resp = check_status(resp_fut.await?).await?;
            let tags: Tags = read_json(resp).await?;
            Ok(tags.models.into_iter().map(|entry| entry.name).collect())
        }
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|err| {
        Error::new(
            format!("unexpected response body: {err}"),
            ErrorKind::InvalidResponse,
        )
    })
}

async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    // Ollama reports failures as `{"error": "..."}`.
    let body = resp.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .map(|body| body.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_owned());
    warn!("ollama responded with {status}: {message}");

    let message = if message.is_empty() {
        format!("ollama responded with {status}")
    } else {
        format!("{message} ({status})")
    };
    Err(Error::new(message, ErrorKind::from_status(status.as_u16())))
}
