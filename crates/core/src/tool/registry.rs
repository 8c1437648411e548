use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::object::{ToolObject, ToolObjectImpl};
use super::{DispatchError, Tool, ToolArgs};

/// How a registered tool is presented to the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolDescriptor {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// The exact invocation syntax, e.g. `/tool:weather{location: <location>}`.
    pub usage: String,
}

/// Maps tool names to tools and dispatches calls to them.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolObject>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    ///
    /// Registering a second tool under the same name replaces the first
    /// one, the replacement keeps the original registration position.
    pub fn register<T: Tool>(&mut self, tool: T) {
        let tool: Arc<dyn ToolObject> = Arc::new(ToolObjectImpl(tool));
        let name = tool.name().to_owned();
        match self.index.get(&name) {
            Some(&idx) => {
                warn!("tool `{name}` is registered twice, replacing the previous one");
                self.tools[idx] = tool;
            }
            None => {
                debug!("registered tool `{name}`");
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
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

    /// Describes all registered tools, in registration order.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_owned(),
                description: tool.description().trim().to_owned(),
                usage: usage(tool.name(), tool.parameter_schema()),
            })
            .collect()
    }

    /// Calls the named tool with `args`.
    ///
    /// The returned future is independent of the registry.
    pub fn dispatch(
        &self,
        name: &str,
        args: ToolArgs,
    ) -> impl Future<Output = Result<String, DispatchError>> + Send + 'static {
        let tool = self.index.get(name).map(|&idx| Arc::clone(&self.tools[idx]));
        let name = name.to_owned();
        async move {
            let Some(tool) = tool else {
                warn!("tool not found: {name}");
                return Err(DispatchError::ToolNotFound(name));
            };
            trace!("executing tool `{name}` with args: {args:?}");
            tool.execute(args).await.map_err(DispatchError::Execution)
        }
    }
}

fn usage(name: &str, schema: &Value) -> String {
    let mut keys: Vec<&str> = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().map(String::as_str).collect())
        .unwrap_or_default();
    keys.sort_unstable();
    if keys.is_empty() {
        return format!("/tool:{name}{{args}}");
    }
    let args = keys
        .iter()
        .map(|key| format!("{key}: <{key}>"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("/tool:{name}{{{args}}}")
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::tool::{Error, ErrorKind, ToolResult};

    #[derive(Deserialize)]
    struct EchoInput {
        text: String,
    }

    struct EchoTool {
        name: &'static str,
        prefix: &'static str,
        schema: Value,
    }

    impl EchoTool {
        fn new(name: &'static str, prefix: &'static str) -> Self {
            Self {
                name,
                prefix,
                schema: json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } }
                }),
            }
        }
    }

    impl Tool for EchoTool {
        type Input = EchoInput;

        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echoes the text back."
        }

        fn parameter_schema(&self) -> &Value {
            &self.schema
        }

        fn execute(
            &self,
            input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            let prefix = self.prefix;
            ready(if input.text == "fail" {
                Err(Error::execution_error().with_reason("asked to fail"))
            } else {
                Ok(format!("{prefix}{}", input.text))
            })
        }
    }

    fn args(pairs: &[(&str, &str)]) -> ToolArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_dispatch_forwards_args() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("echo", ""));

        let result = registry
            .dispatch("echo", args(&[("text", "weather in London, Paris")]))
            .await;
        assert_eq!(result.unwrap(), "weather in London, Paris");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.dispatch("echo", ToolArgs::new()).await.unwrap_err();
        assert_eq!(err, DispatchError::ToolNotFound("echo".to_owned()));
    }

    #[tokio::test]
    async fn test_dispatch_failures() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("echo", ""));

        let err = registry
            .dispatch("echo", args(&[("text", "fail")]))
            .await
            .unwrap_err();
        let DispatchError::Execution(err) = err else {
            panic!("expected an execution error");
        };
        assert_eq!(err.kind(), ErrorKind::ExecutionError);

        let err = registry
            .dispatch("echo", args(&[("body", "hi")]))
            .await
            .unwrap_err();
        let DispatchError::Execution(err) = err else {
            panic!("expected an execution error");
        };
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_register_overwrites_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("echo", "first: "));
        registry.register(EchoTool::new("shout", ""));
        registry.register(EchoTool::new("echo", "second: "));

        assert_eq!(registry.len(), 2);
        let names: Vec<_> =
            registry.list().into_iter().map(|tool| tool.name).collect();
        assert_eq!(names, ["echo", "shout"]);

        let result = registry.dispatch("echo", args(&[("text", "hi")])).await;
        assert_eq!(result.unwrap(), "second: hi");
    }

    #[test]
    fn test_usage() {
        assert_eq!(
            usage(
                "weather",
                &json!({ "properties": { "location": { "type": "string" } } })
            ),
            "/tool:weather{location: <location>}"
        );
        assert_eq!(
            usage(
                "email",
                &json!({ "properties": { "page": {}, "limit": {} } })
            ),
            "/tool:email{limit: <limit>, page: <page>}"
        );
        assert_eq!(usage("ping", &Value::Null), "/tool:ping{args}");
    }
}
