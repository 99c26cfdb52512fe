//! Provider-agnostic core: the conversation client that owns a transcript,
//! the type-erased model client behind it, and the tool abstraction.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod client;
pub mod conversation;
mod error;
mod model_client;
pub mod tool;

pub use client::{ConversationClient, FailurePolicy};
pub use error::Error;
pub use model_client::{ModelClient, ModelClientResponse};
