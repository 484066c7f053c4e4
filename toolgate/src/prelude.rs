//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use toolgate::prelude::*;
//! ```

pub use crate::agent::{Agent, RunResult, ToolCallRecord};
pub use crate::error::{Error, LlmError, OpenApiError, Result, ToolError};
pub use crate::llms::{MockProvider, OpenAI, OpenAIConfig};
#[cfg(feature = "mcp")]
pub use crate::mcp::{McpClient, McpError, McpTool, TransportConfig};
pub use crate::openapi::{
    Document, HttpExecutor, OpenApiProcessor, OperationRef, SpecLoader, SpecSource, convert,
};
pub use crate::responses::{
    FunctionCall, Item, Response, ResponseRequest, ResponsesProvider, SharedProvider, Usage,
};
pub use crate::tool::{
    BoxedTool, DynTool, Tool, ToolBox, ToolCallResult, ToolDefinition, ToolResult,
};
pub use crate::tools::{JsonSpec, OperationTool, RequestsToolkit};
