//! Generic HTTP tools that let the model reach arbitrary URLs.
//!
//! Only `requests_get` is built by default. The mutating tools are opt-in via
//! [`RequestsToolkit::allow_dangerous_requests`], since a model can be talked
//! into sending anything.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::{Error, Result, ToolError};
use crate::openapi::Method;
use crate::tool::{BoxedTool, DynTool, ToolDefinition, ToolResult};

/// Headers applied to every URL starting with a prefix.
#[derive(Debug, Clone, Default)]
struct DomainHeaders {
    entries: Vec<(String, HeaderMap)>,
}

impl DomainHeaders {
    /// Headers of the longest matching prefix.
    fn for_url(&self, url: &str) -> Option<&HeaderMap> {
        self.entries
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, headers)| headers)
    }
}

/// Builds the `requests_*` tools.
#[derive(Debug, Clone)]
pub struct RequestsToolkit {
    client: Client,
    domain_headers: DomainHeaders,
    allow_dangerous_requests: bool,
}

impl Default for RequestsToolkit {
    fn default() -> Self {
        Self::with_client(Client::new())
    }
}

impl RequestsToolkit {
    /// Create a toolkit with its own HTTP client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Create a toolkit sharing an HTTP client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            domain_headers: DomainHeaders::default(),
            allow_dangerous_requests: false,
        }
    }

    /// Send `headers` with every request whose URL starts with `prefix`.
    ///
    /// When several prefixes match, the longest one wins.
    pub fn with_domain_headers<'a>(
        mut self,
        prefix: impl Into<String>,
        headers: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("invalid header name '{name}': {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("invalid value for header '{name}': {e}")))?;
            map.insert(header_name, header_value);
        }
        self.domain_headers.entries.push((prefix.into(), map));
        Ok(self)
    }

    /// Also build the `POST`, `PUT`, `PATCH` and `DELETE` tools.
    #[must_use]
    pub const fn allow_dangerous_requests(mut self, allow: bool) -> Self {
        self.allow_dangerous_requests = allow;
        self
    }

    /// The tools this toolkit provides.
    #[must_use]
    pub fn tools(&self) -> Vec<BoxedTool> {
        let shared = Arc::new(self.clone());
        let methods: &[Method] = if self.allow_dangerous_requests {
            &[
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Patch,
                Method::Delete,
            ]
        } else {
            &[Method::Get]
        };
        methods
            .iter()
            .map(|&method| {
                Box::new(RequestsTool {
                    method,
                    name: format!("requests_{}", method.as_str()),
                    toolkit: Arc::clone(&shared),
                }) as BoxedTool
            })
            .collect()
    }
}

/// Arguments of the `requests_*` tools.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestArgs {
    /// Absolute URL to request.
    pub url: String,
    /// JSON body for methods that carry one.
    #[serde(default)]
    pub data: Option<Value>,
    /// Extra headers for this request.
    #[serde(default)]
    pub headers: Option<Map<String, Value>>,
}

/// What the model gets back from a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestOutcome {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers.
    pub headers: Map<String, Value>,
    /// Response body as text.
    pub body: String,
}

/// One HTTP method exposed as a tool.
#[derive(Debug)]
pub struct RequestsTool {
    method: Method,
    name: String,
    toolkit: Arc<RequestsToolkit>,
}

impl RequestsTool {
    async fn send(&self, args: RequestArgs) -> ToolResult<RequestOutcome> {
        if !args.url.starts_with("http://") && !args.url.starts_with("https://") {
            return Err(ToolError::invalid_args(
                "URL must start with http:// or https://",
            ));
        }

        let mut request = self.toolkit.client.request(self.method.into(), &args.url);
        if let Some(headers) = self.toolkit.domain_headers.for_url(&args.url) {
            request = request.headers(headers.clone());
        }
        for (name, value) in args.headers.iter().flatten() {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            request = request.header(name.as_str(), value);
        }
        if let Some(data) = &args.data
            && self.method.has_body()
        {
            request = request.json(data);
        }

        debug!(tool = %self.name, url = %args.url, "sending request");
        let response = request.send().await?;
        let status_code = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(RequestOutcome {
            status_code,
            headers,
            body,
        })
    }
}

#[async_trait]
impl DynTool for RequestsTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn definition(&self) -> ToolDefinition {
        let mut properties = json!({
            "url": {"type": "string", "description": "Absolute URL to request"},
            "headers": {
                "type": "object",
                "description": "Additional request headers",
                "additionalProperties": {"type": "string"}
            }
        });
        if self.method.has_body() {
            properties["data"] = json!({"description": "JSON payload to send"});
        }
        ToolDefinition::new(
            self.name.clone(),
            format!(
                "Send a {} request to a URL. Returns the status code, headers and body.",
                self.method
            ),
            json!({
                "type": "object",
                "properties": properties,
                "required": ["url"]
            }),
        )
    }

    async fn call_json(&self, args: Value) -> ToolResult<Value> {
        let args: RequestArgs = match args {
            Value::String(text) => serde_json::from_str(&text)?,
            other => serde_json::from_value(other)?,
        };
        let outcome = self.send(args).await?;
        serde_json::to_value(outcome).map_err(|e| ToolError::execution(e.to_string()))
    }
}
