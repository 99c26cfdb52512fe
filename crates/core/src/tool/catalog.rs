use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::future::ready;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::tool::object::{ToolObject, ToolObjectImpl};
use crate::tool::{Error, Tool, ToolResult};

/// The public description of a tool in a [`Catalog`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// The name the tool is called by.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON schema of the arguments.
    pub input_schema: Value,
}

/// A fixed set of tools, looked up by name.
///
/// The catalog is built once and then only read, so it can be shared
/// behind an [`Arc`] by every request handler.
#[derive(Default)]
pub struct Catalog {
    tools: Vec<Arc<dyn ToolObject>>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Registers a tool. A tool with the same name replaces the previous
    /// one in place.
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        let name = tool.name().to_owned();
        let tool: Arc<dyn ToolObject> = Arc::new(ToolObjectImpl(tool));
        match self.by_name.get(&name) {
            Some(&idx) => {
                warn!("tool {name} registered twice, replacing it");
                self.tools[idx] = tool;
            }
            None => {
                self.by_name.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Chaining form of [`add_tool`](Self::add_tool).
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.add_tool(tool);
        self
    }

    /// Returns the definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                input_schema: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Returns `true` if a tool named `name` is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Calls the tool named `name` with JSON `arguments`.
    ///
    /// The returned future doesn't borrow the catalog.
    pub fn call(
        &self,
        name: &str,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> {
        let Some(&idx) = self.by_name.get(name) else {
            warn!("tool not found: {name}");
            let err = Error::not_found()
                .with_reason(format!("Unknown tool: {name}"));
            return Box::pin(ready(Err(err)));
        };
        trace!("calling tool {name} with args: {arguments:?}");
        self.tools[idx].execute(arguments)
    }
}

impl Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|tool| tool.name()))
            .finish()
    }
}
