//! Tool trait and utilities for defining agent tools.
//!
//! Tools are the way a model reaches the outside world. Each tool describes
//! itself with a [`ToolDefinition`] and executes JSON arguments produced by
//! the model.
//!
//! # OpenAI API Alignment
//!
//! [`ToolDefinition`] serializes to the Responses API function tool format:
//! ```json
//! {
//!     "type": "function",
//!     "name": "listFilms",
//!     "description": "...",
//!     "parameters": { ... },
//!     "strict": true
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// A type alias for `Result<T, ToolError>`.
pub type ToolResult<T> = Result<T, ToolError>;

/// Definition of a function tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "function")]
pub struct ToolDefinition {
    /// Name of the tool. Must be unique within a toolbox.
    pub name: String,

    /// What the tool does. The model uses this to decide when to call it.
    #[serde(default)]
    pub description: String,

    /// JSON schema of the arguments.
    pub parameters: Value,

    /// Whether the model output must match the schema exactly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

impl ToolDefinition {
    /// Create a new tool definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            strict: None,
        }
    }

    /// Set strict schema validation.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    /// Check if strict mode is enabled.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        matches!(self.strict, Some(true))
    }
}

/// The core trait for statically typed tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Static name of the tool.
    const NAME: &'static str;

    /// Arguments type for the tool.
    type Args: for<'de> Deserialize<'de> + Send;

    /// Output type of the tool.
    type Output: Serialize + Send;

    /// Error type for tool execution.
    type Error: Into<ToolError> + Send;

    /// Get the name of the tool.
    fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Get the description of the tool.
    fn description(&self) -> String;

    /// Get the JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error>;

    /// Get the tool definition for function calling.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters_schema())
    }

    /// Call the tool with JSON arguments and return JSON output.
    async fn call_json(&self, args: Value) -> ToolResult<Value>
    where
        Self::Output: 'static,
    {
        // Models send arguments as a JSON-encoded string.
        let typed_args: Self::Args = match &args {
            Value::String(s) => serde_json::from_str(s)?,
            _ => serde_json::from_value(args)?,
        };

        let result = self.call(typed_args).await.map_err(Into::into)?;
        serde_json::to_value(result).map_err(|e| ToolError::execution(e.to_string()))
    }
}

/// A boxed dynamic tool that can be used in collections.
pub type BoxedTool = Box<dyn DynTool>;

/// Object-safe version of the Tool trait for dynamic dispatch.
///
/// Tools whose name is only known at runtime (one per API operation, one per
/// MCP server tool) implement this directly.
#[async_trait]
pub trait DynTool: Send + Sync {
    /// Get the name of the tool.
    fn name(&self) -> &str;

    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Call the tool with JSON arguments.
    async fn call_json(&self, args: Value) -> ToolResult<Value>;
}

#[async_trait]
impl<T: Tool + 'static> DynTool for T
where
    T::Output: 'static,
{
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn definition(&self) -> ToolDefinition {
        Tool::definition(self)
    }

    async fn call_json(&self, args: Value) -> ToolResult<Value> {
        Tool::call_json(self, args).await
    }
}

/// Result of a tool call execution.
#[derive(Debug, Clone)]
pub struct ToolCallResult {
    /// The call ID the model assigned.
    pub call_id: String,
    /// The tool name.
    pub name: String,
    /// The result of execution.
    pub result: ToolResult<Value>,
}

impl ToolCallResult {
    /// Create a result.
    #[must_use]
    pub fn new(call_id: impl Into<String>, name: impl Into<String>, result: ToolResult<Value>) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            result,
        }
    }

    /// Check if the call was successful.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Convert to a string representation for the model.
    #[must_use]
    pub fn to_string_for_llm(&self) -> String {
        match &self.result {
            Ok(Value::String(s)) => s.clone(),
            Ok(value) => value.to_string(),
            Err(e) => format!("Error: {e}"),
        }
    }
}

/// A collection of tools that can be used by an agent.
///
/// Definitions are reported in insertion order; adding a tool with an
/// existing name replaces it in place.
#[derive(Default)]
pub struct ToolBox {
    tools: Vec<BoxedTool>,
    index: HashMap<String, usize>,
}

impl ToolBox {
    /// Create a new empty toolbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a typed tool.
    pub fn add<T: Tool + 'static>(&mut self, tool: T)
    where
        T::Output: 'static,
    {
        self.add_boxed(Box::new(tool));
    }

    /// Add a boxed tool.
    pub fn add_boxed(&mut self, tool: BoxedTool) {
        let name = tool.name().to_owned();
        match self.index.get(&name) {
            Some(&slot) => self.tools[slot] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Add every tool of another toolbox.
    pub fn extend(&mut self, other: Self) {
        for tool in other.tools {
            self.add_boxed(tool);
        }
    }

    /// Get a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoxedTool> {
        self.index.get(name).map(|&slot| &self.tools[slot])
    }

    /// Get all tool definitions.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Get the names of all tools.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Check if the toolbox contains a tool with the given name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get the number of tools in the toolbox.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the toolbox is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Call a tool by name with JSON arguments.
    pub async fn call(&self, name: &str, args: Value) -> ToolResult<Value> {
        let tool = self.get(name).ok_or_else(|| ToolError::not_found(name))?;
        tool.call_json(args).await
    }
}

impl fmt::Debug for ToolBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolBox")
            .field("tools", &self.names())
            .finish()
    }
}

impl FromIterator<BoxedTool> for ToolBox {
    fn from_iter<I: IntoIterator<Item = BoxedTool>>(iter: I) -> Self {
        let mut toolbox = Self::new();
        for tool in iter {
            toolbox.add_boxed(tool);
        }
        toolbox
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Shout;

    #[derive(Deserialize)]
    struct ShoutArgs {
        text: String,
    }

    #[async_trait]
    impl Tool for Shout {
        const NAME: &'static str = "shout";
        type Args = ShoutArgs;
        type Output = String;
        type Error = ToolError;

        fn description(&self) -> String {
            "Upper-cases text".to_owned()
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            })
        }

        async fn call(&self, args: ShoutArgs) -> Result<String, ToolError> {
            Ok(args.text.to_uppercase())
        }
    }

    mod tool_definition {
        use super::*;

        #[test]
        fn serializes_flat_function_shape() {
            let def = ToolDefinition::new("listFilms", "List films", json!({"type": "object"}))
                .with_strict(true);
            assert_eq!(
                serde_json::to_value(&def).unwrap(),
                json!({
                    "type": "function",
                    "name": "listFilms",
                    "description": "List films",
                    "parameters": {"type": "object"},
                    "strict": true
                })
            );
        }

        #[test]
        fn omits_unset_strict() {
            let def = ToolDefinition::new("a", "b", json!({}));
            assert!(serde_json::to_value(&def).unwrap().get("strict").is_none());
            assert!(!def.is_strict());
        }

        #[test]
        fn deserializes_saved_functions() {
            let def: ToolDefinition = serde_json::from_value(json!({
                "type": "function",
                "name": "getFilm",
                "parameters": {"type": "object"}
            }))
            .unwrap();
            assert_eq!(def.name, "getFilm");
            assert_eq!(def.description, "");
        }
    }

    mod toolbox {
        use super::*;

        #[tokio::test]
        async fn calls_with_object_or_string_arguments() {
            let mut toolbox = ToolBox::new();
            toolbox.add(Shout);

            let out = toolbox.call("shout", json!({"text": "hi"})).await.unwrap();
            assert_eq!(out, json!("HI"));

            let out = toolbox.call("shout", json!(r#"{"text":"yo"}"#)).await.unwrap();
            assert_eq!(out, json!("YO"));
        }

        #[tokio::test]
        async fn unknown_tool_is_not_found() {
            let toolbox = ToolBox::new();
            let err = toolbox.call("nope", json!({})).await.unwrap_err();
            assert!(matches!(err, ToolError::NotFound(name) if name == "nope"));
        }

        #[tokio::test]
        async fn bad_arguments_are_reported() {
            let mut toolbox = ToolBox::new();
            toolbox.add(Shout);
            let err = toolbox.call("shout", json!({"txt": 1})).await.unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments(_)));
        }

        #[test]
        fn replacing_keeps_position() {
            let mut toolbox = ToolBox::new();
            toolbox.add(Shout);
            toolbox.add(Shout);
            assert_eq!(toolbox.len(), 1);
            assert_eq!(toolbox.names(), vec!["shout"]);
            assert!(toolbox.contains("shout"));
        }
    }

    mod tool_call_result {
        use super::*;

        #[test]
        fn llm_rendering() {
            let ok = ToolCallResult::new("c1", "t", Ok(json!({"a": 1})));
            assert_eq!(ok.to_string_for_llm(), r#"{"a":1}"#);

            let text = ToolCallResult::new("c1", "t", Ok(json!("plain")));
            assert_eq!(text.to_string_for_llm(), "plain");

            let err = ToolCallResult::new("c2", "t", Err(ToolError::http(500, "boom")));
            assert!(!err.is_success());
            assert_eq!(err.to_string_for_llm(), "Error: HTTP 500: boom");
        }
    }
}
