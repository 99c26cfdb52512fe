//! Tool call supports.

mod catalog;
mod error;
mod object;

use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use catalog::{Catalog, ToolDefinition};
pub use error::{Error, ErrorKind};
pub use object::FnTool;

/// The result of a tool call.
pub type ToolResult = Result<Value, Error>;

/// A tool that can be called by a client.
///
/// Implementations of this trait should be stateless, and may not maintain any
/// internal state. A [`Catalog`] shares one instance between every call.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`,
    /// and the future should be cancellation safe.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

/// Creates a tool from a synchronous function. The parameter schema is
/// derived from `I`.
pub fn from_fn<I, F>(
    name: &'static str,
    description: &'static str,
    f: F,
) -> FnTool<I, F>
where
    I: DeserializeOwned + JsonSchema + Send + 'static,
    F: Fn(I) -> ToolResult + Send + Sync + 'static,
{
    FnTool::new(name, description, schema_for!(I).to_value(), f)
}
