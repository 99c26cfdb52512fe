use llm_chat_model::{ErrorKind, ModelProviderError};
use thiserror::Error;

/// Errors surfaced by [`ConversationClient`](crate::ConversationClient).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The input was empty after trimming. Nothing was sent.
    #[error("input is empty")]
    EmptyInput,
    /// The provider call failed, or its reply could not be understood.
    #[error("{message}")]
    Provider {
        /// What went wrong.
        kind: ErrorKind,
        /// A human-readable description from the provider crate.
        message: String,
    },
}

impl Error {
    /// Returns the provider error kind, if this is a provider error.
    #[inline]
    pub fn provider_kind(&self) -> Option<ErrorKind> {
        match self {
            Error::EmptyInput => None,
            Error::Provider { kind, .. } => Some(*kind),
        }
    }
}

impl From<Box<dyn ModelProviderError>> for Error {
    fn from(err: Box<dyn ModelProviderError>) -> Self {
        Error::Provider {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
