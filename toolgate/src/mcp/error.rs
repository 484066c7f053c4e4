//! MCP error types.

/// Errors raised while talking to an MCP server.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum McpError {
    /// Connecting to an HTTP server failed.
    #[error("Failed to connect to MCP server at {url}: {message}")]
    HttpConnectionFailed {
        /// Server URL.
        url: String,
        /// What went wrong.
        message: String,
    },

    /// Spawning or initializing a local server failed.
    #[error("Failed to start MCP server '{command}': {message}")]
    ProcessSpawnFailed {
        /// Command that was run.
        command: String,
        /// What went wrong.
        message: String,
    },

    /// The server did not return its tool list.
    #[error("Failed to list MCP tools: {0}")]
    ListToolsFailed(String),
}
