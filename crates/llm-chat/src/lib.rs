//! Terminal chat clients for OpenAI, Gemini, Ollama and OpenRouter.
//!
//! The crate ships the `llm-chat` binary. The pieces it is assembled from,
//! provider configuration and the interactive loop, are exposed so they
//! can be driven from tests or other hosts.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod command;
mod config;
mod repl;

pub use command::{Command, HELP};
pub use config::{ConfigError, ProviderConfig, ProviderKind};
pub use repl::Repl;

/// Re-exports of [`llm_chat_core`] crate.
pub mod core {
    pub use llm_chat_core::*;
}
