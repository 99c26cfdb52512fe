use std::fmt::{self, Debug};
use std::future::ready;
use std::marker::PhantomData;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;

use super::{Error, Tool, ToolResult};

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    fn execute(
        &self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>>;
}

pub(crate) struct ToolObjectImpl<T: Tool>(pub T);

impl<T: Tool> ToolObject for ToolObjectImpl<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    fn execute(
        &self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> {
        let input: T::Input = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(err) => {
                let reason = format!("{err}");
                return Box::pin(ready(ToolResult::Err(
                    Error::invalid_input().with_reason(reason),
                )));
            }
        };
        let span = debug_span!("tool execute", tool = self.0.name());
        Box::pin(self.0.execute(input).instrument(span))
    }
}

/// A tool backed by a plain function, see [`from_fn`](super::from_fn).
pub struct FnTool<I, F> {
    name: &'static str,
    description: &'static str,
    parameter_schema: Value,
    f: F,
    // `fn(I)` keeps the tool `Send + Sync` whatever `I` is.
    _input: PhantomData<fn(I)>,
}

impl<I, F> FnTool<I, F> {
    #[inline]
    pub(crate) fn new(
        name: &'static str,
        description: &'static str,
        parameter_schema: Value,
        f: F,
    ) -> Self {
        Self {
            name,
            description,
            parameter_schema,
            f,
            _input: PhantomData,
        }
    }
}

impl<I, F> Tool for FnTool<I, F>
where
    I: DeserializeOwned + Send + 'static,
    F: Fn(I) -> ToolResult + Send + Sync + 'static,
{
    type Input = I;

    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: I,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready((self.f)(input))
    }
}

impl<I, F> Debug for FnTool<I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
