//! Tool call supports.

mod error;
mod object;
mod registry;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{DispatchError, Error, ErrorKind};
pub use registry::{ToolDescriptor, ToolRegistry};

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// Arguments of a tool call, as written by the model.
///
/// Keys are unique, a repeated key keeps the last value.
pub type ToolArgs = BTreeMap<String, String>;

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless, and may not maintain any
/// internal state.
///
/// The tool can be context-aware, meaning it can access additional information
/// about the current execution context, such as an API endpoint or a memory
/// handle. To do this, make the context an immutable state of the tool, which
/// can be set during initialization, and copy it when executing.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    ///
    /// It is decoded from a JSON object whose values are all strings.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    ///
    /// The keys of its `properties` are shown to the model as the argument
    /// names of the invocation syntax.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}
