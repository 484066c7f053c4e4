//! Agent configuration.
//!
//! An [`Agent`] bundles a provider, a model, instructions and a
//! [`ToolBox`]. Running it drives the function-calling loop in
//! [`runner`](super::runner).
//!
//! ```rust,ignore
//! let agent = Agent::new("films")
//!     .provider(Arc::new(OpenAI::from_env()?))
//!     .model("gpt-4o")
//!     .instructions("Answer questions using the films API.")
//!     .tools(processor.toolbox()?);
//!
//! let result = agent.run("Give me a few movie examples").await?;
//! println!("{}", result.output);
//! ```

use std::fmt;

use crate::responses::SharedProvider;
use crate::tool::{BoxedTool, ToolBox};

/// A model plus the tools it may call.
pub struct Agent {
    /// Name used in logs.
    pub name: String,
    /// Model id; empty means the provider default.
    pub model: String,
    /// System-level instructions.
    pub instructions: Option<String>,
    /// Backend producing responses.
    pub provider: Option<SharedProvider>,
    /// Tools exposed to the model.
    pub tools: ToolBox,
    /// Maximum number of model round-trips per run.
    pub max_steps: usize,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Output token limit per model response.
    pub max_output_tokens: Option<u32>,
    /// Whether the model may request several calls in one response.
    pub parallel_tool_calls: Option<bool>,
}

impl Agent {
    /// Default step limit.
    pub const DEFAULT_MAX_STEPS: usize = 10;

    /// Create an agent with no provider and no tools.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: String::new(),
            instructions: None,
            provider: None,
            tools: ToolBox::new(),
            max_steps: Self::DEFAULT_MAX_STEPS,
            temperature: None,
            max_output_tokens: None,
            parallel_tool_calls: None,
        }
    }

    /// Set the provider.
    #[must_use]
    pub fn provider(mut self, provider: SharedProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the instructions.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Replace the toolbox.
    #[must_use]
    pub fn tools(mut self, tools: ToolBox) -> Self {
        self.tools = tools;
        self
    }

    /// Add a single tool.
    #[must_use]
    pub fn tool(mut self, tool: BoxedTool) -> Self {
        self.tools.add_boxed(tool);
        self
    }

    /// Set the step limit.
    #[must_use]
    pub const fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap the tokens of each model response.
    #[must_use]
    pub const fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Allow or forbid several function calls in one response.
    #[must_use]
    pub const fn parallel_tool_calls(mut self, parallel: bool) -> Self {
        self.parallel_tool_calls = Some(parallel);
        self
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field(
                "provider",
                &self.provider.as_ref().map(|p| p.provider_name()),
            )
            .field("tools", &self.tools)
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}
