//! Tools for exploring a large JSON document (typically an OpenAPI spec)
//! piece by piece instead of putting it in the prompt.
//!
//! Locations use the syntax `data["paths"]["/films"]["get"]`, with integer
//! indices for arrays: `data["servers"][0]`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ToolError;
use crate::tool::{Tool, ToolBox};

/// Default maximum length of rendered values.
pub const DEFAULT_MAX_VALUE_LENGTH: usize = 200;

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Key(String),
    Index(usize),
}

/// A JSON document plus rendering limits, shared by the exploration tools.
#[derive(Debug, Clone)]
pub struct JsonSpec {
    data: Arc<Value>,
    max_value_length: usize,
}

impl JsonSpec {
    /// Wrap a document.
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self {
            data: Arc::new(data),
            max_value_length: DEFAULT_MAX_VALUE_LENGTH,
        }
    }

    /// Set the maximum length of rendered values.
    #[must_use]
    pub const fn with_max_value_length(mut self, max: usize) -> Self {
        self.max_value_length = max;
        self
    }

    /// Keys of the object at `path`.
    pub fn keys(&self, path: &str) -> Result<Vec<String>, ToolError> {
        match self.lookup(path)? {
            Value::Object(map) => Ok(map.keys().cloned().collect()),
            _ => Err(ToolError::execution(format!(
                "Value at path `{path}` is not a dict, get the value directly."
            ))),
        }
    }

    /// Rendered value at `path`, truncated to the maximum length.
    ///
    /// Objects too large to render are summarised by a hint to list their
    /// keys instead.
    pub fn value(&self, path: &str) -> Result<String, ToolError> {
        let value = self.lookup(path)?;
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if value.is_object() && rendered.len() > self.max_value_length {
            return Ok("Value is a large dictionary, should explore its keys directly".to_owned());
        }
        Ok(truncate(&rendered, self.max_value_length))
    }

    /// A toolbox with the two exploration tools.
    #[must_use]
    pub fn toolbox(&self) -> ToolBox {
        let mut toolbox = ToolBox::new();
        toolbox.add(JsonListKeysTool::new(self.clone()));
        toolbox.add(JsonGetValueTool::new(self.clone()));
        toolbox
    }

    fn lookup(&self, path: &str) -> Result<&Value, ToolError> {
        let mut current = self.data.as_ref();
        for step in parse_path(path)? {
            let next = match (&step, current) {
                (Step::Key(key), Value::Object(map)) => map.get(key),
                (Step::Index(index), Value::Array(items)) => items.get(*index),
                (Step::Index(index), Value::Object(map)) => map.get(&index.to_string()),
                _ => None,
            };
            current = next.ok_or_else(|| {
                let step = match step {
                    Step::Key(key) => key,
                    Step::Index(index) => index.to_string(),
                };
                ToolError::execution(format!("KeyError: {step:?} not found in `{path}`"))
            })?;
        }
        Ok(current)
    }
}

/// Parse `data["a"][0]['b']` into steps. A bare `data` is the root.
fn parse_path(path: &str) -> Result<Vec<Step>, ToolError> {
    let invalid = || ToolError::invalid_args(format!("invalid path `{path}`, expected data[\"key\"][0]..."));
    let mut rest = path
        .trim()
        .strip_prefix("data")
        .ok_or_else(invalid)?;
    let mut steps = Vec::new();

    while !rest.is_empty() {
        rest = rest.strip_prefix('[').ok_or_else(invalid)?;
        let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'');
        let (step, remainder) = if let Some(quote) = quote {
            let body = &rest[1..];
            let end = body.find(&format!("{quote}]")).ok_or_else(invalid)?;
            (Step::Key(body[..end].to_owned()), &body[end + 2..])
        } else {
            let end = rest.find(']').ok_or_else(invalid)?;
            let token = rest[..end].trim();
            let step = token
                .parse::<usize>()
                .map_or_else(|_| Step::Key(token.to_owned()), Step::Index);
            (step, &rest[end + 1..])
        };
        steps.push(step);
        rest = remainder;
    }
    Ok(steps)
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_owned();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Arguments of the exploration tools.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonPathArgs {
    /// Location in the document, e.g. `data["paths"]`.
    pub path: String,
}

fn path_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Location in the document, e.g. data[\"paths\"][\"/films\"]"
            }
        },
        "required": ["path"],
        "additionalProperties": false
    })
}

/// Lists the keys of an object in the document.
#[derive(Debug, Clone)]
pub struct JsonListKeysTool {
    spec: JsonSpec,
}

impl JsonListKeysTool {
    /// Create the tool.
    #[must_use]
    pub const fn new(spec: JsonSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Tool for JsonListKeysTool {
    const NAME: &'static str = "json_spec_list_keys";
    type Args = JsonPathArgs;
    type Output = Vec<String>;
    type Error = ToolError;

    fn description(&self) -> String {
        "List the keys of the JSON object at the given path. \
         Use data to list the top-level keys."
            .to_owned()
    }

    fn parameters_schema(&self) -> Value {
        path_schema()
    }

    async fn call(&self, args: JsonPathArgs) -> Result<Vec<String>, ToolError> {
        self.spec.keys(&args.path)
    }
}

/// Reads a value from the document.
#[derive(Debug, Clone)]
pub struct JsonGetValueTool {
    spec: JsonSpec,
}

impl JsonGetValueTool {
    /// Create the tool.
    #[must_use]
    pub const fn new(spec: JsonSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Tool for JsonGetValueTool {
    const NAME: &'static str = "json_spec_get_value";
    type Args = JsonPathArgs;
    type Output = String;
    type Error = ToolError;

    fn description(&self) -> String {
        "Get the value at the given path. List the keys first if you do not know them.".to_owned()
    }

    fn parameters_schema(&self) -> Value {
        path_schema()
    }

    async fn call(&self, args: JsonPathArgs) -> Result<String, ToolError> {
        self.spec.value(&args.path)
    }
}
