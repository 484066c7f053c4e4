use std::sync::Arc;

use rmcp::{
    ServiceExt,
    model::{ClientCapabilities, Implementation, InitializeRequestParams, Tool},
    service::ServerSink,
    transport::{StreamableHttpClientTransport, child_process::TokioChildProcess},
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::tool::{BoxedTool, ToolBox};

use super::McpTool;
use super::error::McpError;

/// How to reach an MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    /// Streamable HTTP endpoint.
    Http {
        /// Endpoint URL.
        url: String,
    },
    /// Local process speaking MCP over stdio.
    Stdio {
        /// Executable.
        command: String,
        /// Arguments.
        args: Vec<String>,
    },
}

impl TransportConfig {
    /// HTTP transport.
    #[must_use]
    pub fn http(url: impl Into<String>) -> Self {
        Self::Http { url: url.into() }
    }

    /// Stdio transport.
    #[must_use]
    pub fn stdio(command: impl Into<String>, args: &[&str]) -> Self {
        Self::Stdio {
            command: command.into(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
        }
    }
}

/// A connection to a single MCP server.
///
/// ```rust,ignore
/// let client = McpClient::http("http://localhost:9090/mcp").await?;
/// let agent = Agent::new("db").provider(provider).tools(client.toolbox());
/// ```
pub struct McpClient {
    sink: ServerSink,
    tools: Vec<Tool>,
    _service_handle: Arc<JoinHandle<()>>,
}

impl McpClient {
    /// Connects to an HTTP MCP server.
    pub async fn http(url: impl Into<String>) -> Result<Self, McpError> {
        Self::connect(TransportConfig::http(url)).await
    }

    /// Spawns and connects to a local MCP server process.
    pub async fn stdio(command: impl Into<String>, args: &[&str]) -> Result<Self, McpError> {
        Self::connect(TransportConfig::stdio(command, args)).await
    }

    /// Connects using a transport configuration.
    pub async fn connect(transport: TransportConfig) -> Result<Self, McpError> {
        let init = InitializeRequestParams {
            meta: None,
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                ..Default::default()
            },
        };

        let client = match &transport {
            TransportConfig::Http { url } => Self::connect_http(url, init).await?,
            TransportConfig::Stdio { command, args } => {
                Self::connect_stdio(command, args, init).await?
            }
        };
        info!(?transport, tools = client.tools.len(), "connected to MCP server");
        Ok(client)
    }

    /// Tool names advertised by the server.
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_ref()).collect()
    }

    /// Every server tool.
    #[must_use]
    pub fn toolbox(&self) -> ToolBox {
        self.select(|_| true)
    }

    /// Only the server tools named in `allowed`; an empty list keeps them all.
    ///
    /// Names the server does not advertise are logged and skipped.
    #[must_use]
    pub fn toolbox_filtered<S: AsRef<str>>(&self, allowed: &[S]) -> ToolBox {
        for name in unadvertised(&self.tool_names(), allowed) {
            warn!(tool = name, "MCP server does not advertise allowed tool");
        }
        self.select(|name| is_allowed(allowed, name))
    }

    fn select(&self, keep: impl Fn(&str) -> bool) -> ToolBox {
        self.tools
            .iter()
            .filter(|t| keep(t.name.as_ref()))
            .map(|t| Box::new(McpTool::new(t.clone(), self.sink.clone())) as BoxedTool)
            .collect()
    }

    async fn connect_http(url: &str, init: InitializeRequestParams) -> Result<Self, McpError> {
        let transport = StreamableHttpClientTransport::from_uri(url);

        let service = init
            .serve(transport)
            .await
            .map_err(|e| McpError::HttpConnectionFailed {
                url: url.to_owned(),
                message: e.to_string(),
            })?;

        let sink = service.peer().clone();
        let tools = service
            .peer()
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::ListToolsFailed(e.to_string()))?
            .tools;

        let handle = tokio::spawn(async move {
            let _ = service.waiting().await;
        });

        Ok(Self {
            sink,
            tools,
            _service_handle: Arc::new(handle),
        })
    }

    async fn connect_stdio(
        command: &str,
        args: &[String],
        init: InitializeRequestParams,
    ) -> Result<Self, McpError> {
        let spawn_error = |message: String| McpError::ProcessSpawnFailed {
            command: command.to_owned(),
            message,
        };

        let mut cmd = tokio::process::Command::new(command);
        cmd.args(args);

        let transport = TokioChildProcess::new(cmd).map_err(|e| spawn_error(e.to_string()))?;
        let service = init
            .serve(transport)
            .await
            .map_err(|e| spawn_error(e.to_string()))?;

        let sink = service.peer().clone();
        let tools = service
            .peer()
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::ListToolsFailed(e.to_string()))?
            .tools;

        let handle = tokio::spawn(async move {
            let _ = service.waiting().await;
        });

        Ok(Self {
            sink,
            tools,
            _service_handle: Arc::new(handle),
        })
    }
}

fn is_allowed<S: AsRef<str>>(allowed: &[S], name: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|a| a.as_ref() == name)
}

fn unadvertised<'a, S: AsRef<str>>(advertised: &[&str], allowed: &'a [S]) -> Vec<&'a str> {
    allowed
        .iter()
        .map(S::as_ref)
        .filter(|name| !advertised.contains(name))
        .collect()
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("tools", &self.tool_names())
            .finish_non_exhaustive()
    }
}
