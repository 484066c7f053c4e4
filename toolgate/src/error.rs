//! Unified error types for toolgate.
//!
//! This module provides the error hierarchy covering:
//! - LLM provider errors (authentication, rate limiting, etc.)
//! - OpenAPI document errors (malformed documents, dangling references)
//! - Tool execution errors (unknown functions, bad arguments, HTTP failures)
//! - Agent runtime errors

use std::fmt;

/// Result type alias for toolgate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for toolgate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// LLM provider error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool execution error.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// OpenAPI document error.
    #[error("OpenAPI error: {0}")]
    OpenApi(#[from] OpenApiError),

    /// MCP server error.
    #[cfg(feature = "mcp")]
    #[error("MCP error: {0}")]
    Mcp(#[from] crate::mcp::McpError),

    /// Missing or inconsistent configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Maximum steps reached during agent execution.
    #[error("Maximum steps ({max_steps}) reached without final answer")]
    MaxSteps {
        /// The maximum number of steps configured.
        max_steps: usize,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a max steps error.
    #[must_use]
    pub const fn max_steps(max_steps: usize) -> Self {
        Self::MaxSteps { max_steps }
    }
}

/// Error type for LLM provider operations.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LlmError {
    /// The error kind.
    pub kind: LlmErrorKind,
    /// The provider name (e.g., "openai").
    pub provider: Option<String>,
    /// Additional error message.
    pub message: String,
    /// Optional error code from the provider.
    pub code: Option<String>,
}

/// Categories of LLM errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LlmErrorKind {
    /// Authentication or authorization failure.
    Auth,
    /// Rate limit exceeded.
    RateLimited,
    /// Context length exceeded.
    ContextExceeded,
    /// Response format error.
    ResponseFormat,
    /// Network or connection error.
    Network,
    /// HTTP status error.
    HttpStatus,
    /// Provider-specific error.
    Provider,
    /// Internal error.
    Internal,
}

impl LlmError {
    fn with_kind(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            provider: None,
            message: message.into(),
            code: None,
        }
    }

    /// Create an authentication error.
    #[must_use]
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::with_kind(LlmErrorKind::Auth, message)
        }
    }

    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::with_kind(
                LlmErrorKind::RateLimited,
                "Rate limit exceeded. Please retry after some time.",
            )
        }
    }

    /// Create a context exceeded error.
    #[must_use]
    pub fn context_exceeded(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::ContextExceeded, message)
    }

    /// Create a response format error.
    #[must_use]
    pub fn response_format(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::with_kind(
            LlmErrorKind::ResponseFormat,
            format!("Expected {}, got {}", expected.into(), got.into()),
        )
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::Network, message)
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            code: Some(status.to_string()),
            ..Self::with_kind(
                LlmErrorKind::HttpStatus,
                format!("HTTP {status}: {}", body.into()),
            )
        }
    }

    /// Create a provider error with an error code.
    #[must_use]
    pub fn provider_code(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: Some(provider.into()),
            code: Some(code.into()),
            ..Self::with_kind(LlmErrorKind::Provider, message)
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_kind(LlmErrorKind::Internal, message)
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{provider}] ")?;
        }
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Error type for OpenAPI documents.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum OpenApiError {
    /// The document could not be interpreted as OpenAPI.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A `$ref` pointed nowhere, outside the document, or back at itself.
    #[error("Unresolved reference: {0}")]
    UnresolvedRef(String),

    /// Fetching the document failed.
    #[error("Failed to fetch {url}: {message}")]
    Fetch {
        /// Location of the document.
        url: String,
        /// What went wrong.
        message: String,
    },
}

impl OpenApiError {
    /// Create an invalid document error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }

    /// Create an unresolved reference error.
    #[must_use]
    pub fn unresolved(reference: impl Into<String>) -> Self {
        Self::UnresolvedRef(reference.into())
    }
}

/// Error type for tool execution failures.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ToolError {
    /// Error during tool execution.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Invalid arguments provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Tool not found.
    #[error("Unknown function: {0}")]
    NotFound(String),

    /// The remote API answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

impl ToolError {
    /// Create an execution error.
    #[must_use]
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create an invalid arguments error.
    #[must_use]
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArguments(err.to_string())
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        Self::Execution(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    mod error {
        use super::*;

        #[test]
        fn config_creates_error() {
            let err = Error::config("no api url");
            assert!(matches!(err, Error::Config(_)));
            assert!(err.to_string().contains("no api url"));
        }

        #[test]
        fn max_steps_creates_error() {
            let err = Error::max_steps(10);
            assert!(matches!(err, Error::MaxSteps { max_steps: 10 }));
            assert!(err.to_string().contains("10"));
        }

        #[test]
        fn from_tool_error() {
            let err: Error = ToolError::not_found("listFilms").into();
            assert!(matches!(err, Error::Tool(_)));
        }

        #[test]
        fn from_openapi_error() {
            let err: Error = OpenApiError::unresolved("#/components/schemas/Film").into();
            assert!(matches!(err, Error::OpenApi(_)));
            assert!(err.to_string().contains("#/components/schemas/Film"));
        }

        #[test]
        fn from_json_error() {
            let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    mod llm_error {
        use super::*;

        #[test]
        fn auth_carries_provider() {
            let err = LlmError::auth("openai", "Invalid API key");
            assert_eq!(err.kind, LlmErrorKind::Auth);
            assert_eq!(err.provider.as_deref(), Some("openai"));
            assert!(err.code.is_none());
        }

        #[test]
        fn http_status_sets_code() {
            let err = LlmError::http_status(503, "Service Unavailable");
            assert_eq!(err.kind, LlmErrorKind::HttpStatus);
            assert_eq!(err.code.as_deref(), Some("503"));
            assert!(err.to_string().contains("(code: 503)"));
        }

        #[test]
        fn provider_code_display() {
            let err = LlmError::provider_code("openai", "model_not_found", "no such model");
            assert_eq!(err.to_string(), "[openai] no such model (code: model_not_found)");
        }

        #[test]
        fn display_without_provider() {
            let s = LlmError::network("timeout").to_string();
            assert!(!s.contains('['));
            assert_eq!(s, "timeout");
        }
    }

    mod tool_error {
        use super::*;

        #[test]
        fn not_found_mentions_name() {
            let err = ToolError::not_found("getFilm");
            assert_eq!(err.to_string(), "Unknown function: getFilm");
        }

        #[test]
        fn http_display() {
            let err = ToolError::http(404, "not found");
            assert_eq!(err.to_string(), "HTTP 404: not found");
        }

        #[test]
        fn from_serde_json_error() {
            let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
            let err: ToolError = json_err.into();
            assert!(matches!(err, ToolError::InvalidArguments(_)));
        }
    }
}
