use recall_agent_core::memory::MemorySearch;
use recall_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize, JsonSchema)]
pub struct SearchParameters {
    #[schemars(description = "What to look for in past messages.")]
    query: String,
}

/// A tool for recalling past messages from the long-term memory.
pub struct SearchTool {
    memory: MemorySearch,
    parameter_schema: Value,
}

impl SearchTool {
    /// Creates a search tool over the given memory.
    #[inline]
    pub fn new(memory: MemorySearch) -> Self {
        SearchTool {
            memory,
            parameter_schema: schema_for!(SearchParameters).to_value(),
        }
    }
}

impl Tool for SearchTool {
    type Input = SearchParameters;

    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search through long-term memory"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SearchParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let memory = self.memory.clone();
        async move {
            let found = memory.search(&input.query).await.map_err(|err| {
                ToolError::execution_error().with_reason(format!("{err}"))
            })?;
            if found.is_empty() {
                return Ok("No relevant memories found.".to_owned());
            }
            let contents: Vec<_> = found.iter().map(|m| m.content()).collect();
            Ok(contents.join("\n"))
        }
    }
}
