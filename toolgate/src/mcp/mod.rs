//! Model Context Protocol (MCP) tools.
//!
//! Connects to an MCP server over streamable HTTP or a stdio child process and
//! exposes its tools to an [`Agent`](crate::agent::Agent).
//!
//! ```rust,ignore
//! use toolgate::mcp::McpClient;
//!
//! let client = McpClient::http("http://localhost:9090/mcp").await?;
//! println!("Tools: {:?}", client.tool_names());
//! ```

mod client;
mod error;
mod tool;

pub use client::{McpClient, TransportConfig};
pub use error::McpError;
pub use tool::McpTool;
