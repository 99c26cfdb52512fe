//! An arithmetic tool server speaking JSON-RPC over stdio or HTTP.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod arith;
pub mod rpc;
pub mod tools;
pub mod transport;

pub use rpc::Dispatcher;
