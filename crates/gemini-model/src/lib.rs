//! A model provider for Google Gemini's `generateContent` API.

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
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

pub use config::{GEMINI_BASE_URL, GeminiConfig, GeminiConfigBuilder};
use proto::{ErrorEnvelope, GenerateContentResponse, ModelList};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error type for [`GeminiProvider`].
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

/// The response of [`GeminiProvider`]. Gemini answers with the whole
/// message at once, so this replays it as a single delta.
pub type GeminiResponse = CompleteResponse<Error>;

/// Gemini model provider.
#[derive(Clone, Debug)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(API_KEY_HEADER, self.config.api_key.as_str())
    }
}

impl ModelProvider for GeminiProvider {
    type Error = Error;
    type Response = GeminiResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let body = proto::create_request(req);
        debug!(
            "sending generateContent request for model {} ({} messages)",
            req.model,
            req.messages.len()
        );
        let resp_fut = self
            .authorized(self.client.post(self.config.generate_url(&req.model)))
            .json(&body)
            .send();

        async move {
            let resp = check_status(resp_fut.await?).await?;
            let resp: GenerateContentResponse = read_json(resp).await?;
            into_response(resp)
        }
    }

    fn list_models(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'static
    {
        let resp_fut = self
            .authorized(self.client.get(self.config.models_url()))
            .send();

        async move {
            let resp = check_status(resp_fut.await?).await?;
            let list: ModelList = read_json(resp).await?;
            Ok(list
                .models
                .into_iter()
                .map(|entry| match entry.name.strip_prefix("models/") {
                    Some(name) => name.to_owned(),
                    None => entry.name,
                })
                .collect())
        }
    }
}

fn into_response(
    resp: GenerateContentResponse,
) -> Result<GeminiResponse, Error> {
    let Some(candidate) = resp.candidates.into_iter().next() else {
        if let Some(reason) =
            resp.prompt_feedback.and_then(|feedback| feedback.block_reason)
        {
            return Err(Error::new(
                format!("prompt was blocked: {reason}"),
                ErrorKind::Moderated,
            ));
        }
        return Err(Error::new(
            "response has no candidates",
            ErrorKind::InvalidResponse,
        ));
    };

    let reason = candidate
        .finish_reason
        .as_deref()
        .map(ModelFinishReason::from_provider_str)
        .unwrap_or(ModelFinishReason::Stop);
    let text: String = candidate
        .content
        .map(|content| {
            content.parts.into_iter().map(|part| part.text).collect()
        })
        .unwrap_or_default();
    if text.is_empty() && reason == ModelFinishReason::ContentFilter {
        return Err(Error::new(
            "reply was withheld by the safety filter",
            ErrorKind::Moderated,
        ));
    }
    Ok(CompleteResponse::from_text(text, reason))
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

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_blocked_prompt() {
        let resp =
            parse(json!({ "promptFeedback": { "blockReason": "SAFETY" } }));
        let err = into_response(resp).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Moderated);

        let resp = parse(json!({ "candidates": [] }));
        let err = into_response(resp).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[test]
    fn test_withheld_reply() {
        let resp =
            parse(json!({ "candidates": [{ "finishReason": "SAFETY" }] }));
        let err = into_response(resp).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Moderated);
    }
}
