//! OpenAI Responses API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{LlmError, Result};
use crate::responses::{Response, ResponseRequest, ResponsesProvider};

use super::config::OpenAIConfig;

/// OpenAI error response.
#[derive(Debug, Clone, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

/// OpenAI error details.
#[derive(Debug, Clone, Deserialize)]
struct OpenAIError {
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// OpenAI API client.
#[derive(Debug, Clone)]
pub struct OpenAI {
    config: Arc<OpenAIConfig>,
    client: Client,
}

impl OpenAI {
    /// Create a new OpenAI client with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::auth("openai", "API key is required").into());
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let client = builder
            .build()
            .map_err(|e| LlmError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = OpenAIConfig::from_env()?;
        Self::new(config)
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the default model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        req
    }

    /// Parse an error response from OpenAI.
    fn parse_error(status: u16, body: &str) -> LlmError {
        if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(body) {
            let error = error_response.error;
            let code = error
                .code
                .or(error.error_type)
                .unwrap_or_else(|| status.to_string());

            return match status {
                401 => LlmError::auth("openai", error.message),
                429 => LlmError::rate_limited("openai"),
                _ if code == "context_length_exceeded"
                    || error.message.contains("context_length") =>
                {
                    LlmError::context_exceeded(error.message)
                }
                _ => LlmError::provider_code("openai", code, error.message),
            };
        }

        match status {
            401 => LlmError::auth("openai", body.to_owned()),
            429 => LlmError::rate_limited("openai"),
            _ => LlmError::http_status(status, body.to_owned()),
        }
    }
}

#[async_trait]
impl ResponsesProvider for OpenAI {
    async fn create(&self, request: &ResponseRequest) -> Result<Response> {
        let url = self.responses_url();
        let body = if request.model.is_empty() {
            ResponseRequest {
                model: self.config.model.clone(),
                ..request.clone()
            }
        } else {
            request.clone()
        };

        debug!(
            model = %body.model,
            input_items = body.input.len(),
            tools = body.tools.len(),
            "creating response"
        );

        let response = self
            .build_request(&url)
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &error_text).into());
        }

        let text = response.text().await.map_err(LlmError::from)?;
        let parsed: Response = serde_json::from_str(&text)
            .map_err(|e| LlmError::response_format("Responses API object", e.to_string()))?;

        if parsed.status.as_deref() == Some("failed") {
            return Err(LlmError::provider_code("openai", "failed", text).into());
        }
        Ok(parsed)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }
}
