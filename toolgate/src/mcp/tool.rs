//! MCP server tools exposed through [`DynTool`].

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, RawContent, Tool};
use rmcp::service::ServerSink;
use serde_json::{Map, Value, json};

use crate::error::ToolError;
use crate::tool::{DynTool, ToolDefinition, ToolResult};

/// A tool living on an MCP server.
#[derive(Clone)]
pub struct McpTool {
    tool: Tool,
    sink: ServerSink,
}

impl McpTool {
    /// Wrap a tool advertised by the server behind `sink`.
    #[must_use]
    pub const fn new(tool: Tool, sink: ServerSink) -> Self {
        Self { tool, sink }
    }
}

impl std::fmt::Debug for McpTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpTool")
            .field("name", &self.tool.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DynTool for McpTool {
    fn name(&self) -> &str {
        &self.tool.name
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.tool.name.to_string(),
            self.tool
                .description
                .as_deref()
                .unwrap_or_default()
                .to_owned(),
            Value::Object(self.tool.input_schema.as_ref().clone()),
        )
    }

    async fn call_json(&self, args: Value) -> ToolResult<Value> {
        let arguments: Map<String, Value> = match args {
            Value::String(text) if text.trim().is_empty() => Map::new(),
            Value::String(text) => serde_json::from_str(&text)?,
            Value::Null => Map::new(),
            other => serde_json::from_value(other)?,
        };
        let params: CallToolRequestParams = serde_json::from_value(json!({
            "name": self.tool.name,
            "arguments": arguments,
        }))
        .map_err(|e| ToolError::execution(e.to_string()))?;

        let result = self
            .sink
            .call_tool(params)
            .await
            .map_err(|e| ToolError::execution(format!("MCP call failed: {e}")))?;
        into_value(result)
    }
}

/// Structured content when present, otherwise the text parts joined.
fn into_value(result: CallToolResult) -> ToolResult<Value> {
    let text = result
        .content
        .iter()
        .map(|content| match &content.raw {
            RawContent::Text(part) => part.text.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        })
        .collect::<Vec<_>>()
        .join("\n");

    if result.is_error == Some(true) {
        return Err(ToolError::execution(text));
    }
    Ok(result.structured_content.unwrap_or(Value::String(text)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use rmcp::model::Content;

    #[test]
    fn text_content_is_joined() {
        let result = CallToolResult::success(vec![Content::text("a"), Content::text("b")]);
        assert_eq!(into_value(result).unwrap(), json!("a\nb"));
    }

    #[test]
    fn error_results_fail() {
        let result = CallToolResult::error(vec![Content::text("table not found")]);
        let err = into_value(result).unwrap_err();
        assert_eq!(err.to_string(), "Execution error: table not found");
    }
}
