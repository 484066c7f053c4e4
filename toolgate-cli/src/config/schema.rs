//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use toolgate::agent::Agent;
use toolgate::llms::OpenAIConfig;
use toolgate::openapi::{DEFAULT_FUNCTIONS_FILE, DEFAULT_RAW_SPEC_FILE};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolgateConfig {
    /// Model service settings.
    #[serde(default)]
    pub openai: OpenAiSection,

    /// Target API settings.
    #[serde(default)]
    pub api: ApiSection,

    /// Agent settings.
    #[serde(default)]
    pub agent: AgentSection,

    /// Where `convert` writes its files.
    #[serde(default)]
    pub output: OutputSection,
}

/// `[openai]` section. Each value is overridden by its `OPENAI_*` variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiSection {
    /// API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Organization ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// `[api]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSection {
    /// OpenAPI document URL or file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    /// Base URL calls are sent to, instead of the document's server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Generate strict function definitions.
    #[serde(default)]
    pub strict: bool,
    /// Headers sent with every API call.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// `[agent]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSection {
    /// Model override for agent runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Model round-trips allowed per question.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// System instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Output token limit per model response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            model: None,
            max_steps: Agent::DEFAULT_MAX_STEPS,
            instructions: None,
            max_output_tokens: None,
        }
    }
}

const fn default_max_steps() -> usize {
    Agent::DEFAULT_MAX_STEPS
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSection {
    /// Generated function definitions.
    #[serde(default = "default_functions_file")]
    pub functions_file: PathBuf,
    /// Pretty copy of the fetched document.
    #[serde(default = "default_raw_spec_file")]
    pub raw_spec_file: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            functions_file: default_functions_file(),
            raw_spec_file: default_raw_spec_file(),
        }
    }
}

fn default_functions_file() -> PathBuf {
    PathBuf::from(DEFAULT_FUNCTIONS_FILE)
}

fn default_raw_spec_file() -> PathBuf {
    PathBuf::from(DEFAULT_RAW_SPEC_FILE)
}

/// Placeholder printed instead of secret values.
pub const REDACTED: &str = "<redacted>";

impl ToolgateConfig {
    /// A copy safe to print: the API key and every API header value are
    /// replaced by [`REDACTED`].
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.openai.api_key.is_some() {
            config.openai.api_key = Some(REDACTED.to_owned());
        }
        for value in config.api.headers.values_mut() {
            REDACTED.clone_into(value);
        }
        config
    }

    /// Build the model client config: `lookup` (the environment) first,
    /// then the `[openai]` section.
    pub fn openai_config(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> toolgate::Result<OpenAIConfig> {
        let file = &self.openai;
        let merged = |name: &str| {
            lookup(name).or_else(|| match name {
                "OPENAI_API_KEY" => file.api_key.clone(),
                "OPENAI_BASE_URL" => file.base_url.clone(),
                "OPENAI_MODEL" => file.model.clone(),
                "OPENAI_ORGANIZATION" => file.organization.clone(),
                _ => None,
            })
        };
        let config = OpenAIConfig::from_lookup(merged)?;
        Ok(match file.timeout_secs {
            Some(secs) => config.with_timeout(secs),
            None => config,
        })
    }
}
