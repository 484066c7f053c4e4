//! Provider-neutral model of the Responses API.
//!
//! A conversation is a list of [`Item`]s. The model's output items are
//! appended verbatim to the next request's input, which keeps provider
//! specific items (e.g. reasoning) intact even though they are not modelled.

use std::ops::{Add, AddAssign};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::tool::ToolDefinition;

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End user.
    User,
    /// The model.
    Assistant,
    /// System prompt.
    System,
    /// Developer instructions.
    Developer,
}

/// One content part of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    /// Part type, e.g. `input_text`, `output_text`, `refusal`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Text of text parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Remaining fields, kept for round-tripping.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentPart {
    /// An `input_text` part.
    #[must_use]
    pub fn input_text(text: impl Into<String>) -> Self {
        Self {
            kind: "input_text".to_owned(),
            text: Some(text.into()),
            extra: Map::new(),
        }
    }
}

/// Message content: plain text or typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text.
    Text(String),
    /// Typed parts.
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenated text of the content.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter(|p| p.kind == "output_text" || p.kind == "input_text")
                .filter_map(|p| p.text.as_deref())
                .collect(),
        }
    }
}

/// Items with a known shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KnownItem {
    /// A message from the user, system or model.
    Message {
        /// Item id assigned by the provider.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Author role.
        role: Role,
        /// Message content.
        content: MessageContent,
        /// Item status.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    /// The model asks for a function to be called.
    FunctionCall {
        /// Item id assigned by the provider.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Correlates the call with its output.
        call_id: String,
        /// Function name.
        name: String,
        /// JSON-encoded arguments.
        arguments: String,
        /// Item status.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    /// The result of a function call.
    FunctionCallOutput {
        /// The call this answers.
        call_id: String,
        /// Output text.
        output: String,
    },
}

/// A conversation item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Item {
    /// An item this crate understands.
    Known(KnownItem),
    /// Any other item, passed through untouched.
    Other(Value),
}

impl Item {
    /// A user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::message(Role::User, text)
    }

    /// A message with the given role.
    #[must_use]
    pub fn message(role: Role, text: impl Into<String>) -> Self {
        Self::Known(KnownItem::Message {
            id: None,
            role,
            content: MessageContent::Text(text.into()),
            status: None,
        })
    }

    /// A function call output.
    #[must_use]
    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Known(KnownItem::FunctionCallOutput {
            call_id: call_id.into(),
            output: output.into(),
        })
    }

    /// The function call carried by this item, if it is one.
    #[must_use]
    pub fn as_function_call(&self) -> Option<FunctionCall> {
        match self {
            Self::Known(KnownItem::FunctionCall {
                call_id,
                name,
                arguments,
                ..
            }) => Some(FunctionCall {
                call_id: call_id.clone(),
                name: name.clone(),
                arguments: arguments.clone(),
            }),
            _ => None,
        }
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Correlates the call with its output.
    pub call_id: String,
    /// Function name.
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

impl FunctionCall {
    /// Create a function call.
    #[must_use]
    pub fn new(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Decode the arguments. An empty string means no arguments.
    pub fn parse_arguments(&self) -> serde_json::Result<Value> {
        if self.arguments.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&self.arguments)
    }
}

impl From<FunctionCall> for Item {
    fn from(call: FunctionCall) -> Self {
        Self::Known(KnownItem::FunctionCall {
            id: None,
            call_id: call.call_id,
            name: call.name,
            arguments: call.arguments,
            status: None,
        })
    }
}

/// Token usage of a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the input.
    #[serde(default)]
    pub input_tokens: u32,
    /// Tokens in the output.
    #[serde(default)]
    pub output_tokens: u32,
    /// Total tokens.
    #[serde(default)]
    pub total_tokens: u32,
}

impl Add for Usage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            input_tokens: self.input_tokens + rhs.input_tokens,
            output_tokens: self.output_tokens + rhs.output_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// A request to create a model response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseRequest {
    /// Model id. Empty means the provider default.
    pub model: String,
    /// Conversation so far.
    pub input: Vec<Item>,
    /// Tools the model may call.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    /// System-level instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Whether the model may call several functions at once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Output token limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl ResponseRequest {
    /// Create a request for `model` with the given input.
    #[must_use]
    pub fn new(model: impl Into<String>, input: Vec<Item>) -> Self {
        Self {
            model: model.into(),
            input,
            ..Self::default()
        }
    }

    /// Set the available tools.
    #[must_use]
    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the instructions.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A model response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response id.
    #[serde(default)]
    pub id: String,
    /// Model that produced the response.
    #[serde(default)]
    pub model: String,
    /// `completed`, `incomplete`, `failed`, ...
    #[serde(default)]
    pub status: Option<String>,
    /// Output items.
    #[serde(default)]
    pub output: Vec<Item>,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl Response {
    /// Concatenated text of all assistant messages.
    #[must_use]
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(|item| match item {
                Item::Known(KnownItem::Message {
                    role: Role::Assistant,
                    content,
                    ..
                }) => Some(content.text()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Function calls requested by the model, in output order.
    #[must_use]
    pub fn function_calls(&self) -> Vec<FunctionCall> {
        self.output.iter().filter_map(Item::as_function_call).collect()
    }
}

/// A backend that creates model responses.
#[async_trait]
pub trait ResponsesProvider: Send + Sync {
    /// Create a response for the request.
    async fn create(&self, request: &ResponseRequest) -> Result<Response>;

    /// Name used in logs and errors.
    fn provider_name(&self) -> &'static str;

    /// Model used when the request leaves it empty.
    fn default_model(&self) -> &str;
}

/// Type alias for an Arc-wrapped provider.
pub type SharedProvider = Arc<dyn ResponsesProvider>;
