//! An abstraction layer for different LLM providers.
//!
//! This crate establishes an unified protocol for the chat clients to
//! interact with various supported providers, so that a conversation can
//! seamlessly switch between them without modifying the core codebase.
//!
//! Apart from [`CompleteResponse`], types in this crate don't define any
//! behavior, instead they are the constraints that the implementors should
//! adhere to.

#![deny(missing_docs)]

mod complete;
mod error;
mod provider;
mod request;
mod response;

pub use complete::*;
pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
