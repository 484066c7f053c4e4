//! The function-calling loop.
//!
//! 1. Send the conversation and the tool definitions to the model
//! 2. Append every output item to the conversation
//! 3. No function calls: the output text is the answer
//! 4. Otherwise run each call in order, append its output, and go to 1
//!
//! Tool failures are reported to the model as `Error: ...` outputs so it can
//! correct itself; only provider errors and the step limit end a run early.

use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::{Error, Result, ToolError};
use crate::responses::{FunctionCall, Item, ResponseRequest, Usage};
use crate::tool::ToolCallResult;

use super::config::Agent;
use super::result::{RunResult, ToolCallRecord};

impl Agent {
    /// Run the agent on a user prompt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no provider is configured,
    /// [`Error::MaxSteps`] if the model is still calling tools after
    /// `max_steps` round-trips, or the provider's error.
    pub async fn run(&self, prompt: impl Into<String>) -> Result<RunResult> {
        self.run_items(vec![Item::user(prompt)]).await
    }

    /// Run the agent on an existing conversation.
    pub async fn run_items(&self, input: Vec<Item>) -> Result<RunResult> {
        let span = info_span!(
            "agent",
            agent.name = %self.name,
            agent.model = %self.model,
            agent.max_steps = self.max_steps,
            agent.tools = self.tools.len(),
            agent.steps = tracing::field::Empty,
        );
        self.run_inner(input).instrument(span).await
    }

    async fn run_inner(&self, mut items: Vec<Item>) -> Result<RunResult> {
        let provider = self.provider.as_deref().ok_or_else(|| {
            Error::config(format!(
                "Agent '{}' has no provider configured. Call .provider() before running.",
                self.name
            ))
        })?;

        let model = if self.model.is_empty() {
            provider.default_model().to_owned()
        } else {
            self.model.clone()
        };
        let definitions = self.tools.definitions();
        let mut usage = Usage::default();
        let mut tool_calls = Vec::new();

        for step in 1..=self.max_steps {
            debug!(step, items = items.len(), "requesting model response");

            let mut request = ResponseRequest::new(&model, items.clone()).tools(definitions.clone());
            request.instructions.clone_from(&self.instructions);
            request.temperature = self.temperature;
            request.max_output_tokens = self.max_output_tokens;
            request.parallel_tool_calls = self.parallel_tool_calls;

            let response = provider.create(&request).await?;
            if let Some(step_usage) = response.usage {
                usage += step_usage;
            }

            let calls = response.function_calls();
            let output = response.output_text();
            items.extend(response.output);

            if calls.is_empty() {
                tracing::Span::current().record("agent.steps", step);
                info!(steps = step, tool_calls = tool_calls.len(), "agent finished");
                return Ok(RunResult {
                    output,
                    steps: step,
                    tool_calls,
                    usage,
                    items,
                });
            }

            for call in &calls {
                let record = self.execute_call(call).await;
                items.push(Item::function_call_output(&record.call_id, &record.output));
                tool_calls.push(record);
            }
        }

        warn!(max_steps = self.max_steps, "agent hit the step limit");
        Err(Error::max_steps(self.max_steps))
    }

    async fn execute_call(&self, call: &FunctionCall) -> ToolCallRecord {
        let span = info_span!(
            "tool",
            tool.name = %call.name,
            tool.id = %call.call_id,
            tool.input = %call.arguments,
            tool.success = tracing::field::Empty,
        );

        async {
            let result = match call.parse_arguments() {
                Ok(args) => self.tools.call(&call.name, args).await,
                Err(e) => Err(ToolError::from(e)),
            };
            let result = ToolCallResult::new(&call.call_id, &call.name, result);
            let success = result.is_success();
            tracing::Span::current().record("tool.success", success);
            if let Err(e) = &result.result {
                warn!(tool = %call.name, error = %e, "tool call failed");
            }

            ToolCallRecord {
                call_id: call.call_id.clone(),
                name: call.name.clone(),
                arguments: call.arguments.clone(),
                output: result.to_string_for_llm(),
                success,
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::llms::MockProvider;
    use crate::responses::{KnownItem, Response};
    use crate::tool::{Tool, ToolBox};

    struct Add;

    #[derive(Deserialize)]
    struct AddArgs {
        a: i64,
        b: i64,
    }

    #[async_trait]
    impl Tool for Add {
        const NAME: &'static str = "add";
        type Args = AddArgs;
        type Output = i64;
        type Error = ToolError;

        fn description(&self) -> String {
            "Add two integers".to_owned()
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
                "required": ["a", "b"]
            })
        }

        async fn call(&self, args: AddArgs) -> std::result::Result<i64, ToolError> {
            Ok(args.a + args.b)
        }
    }

    fn toolbox() -> ToolBox {
        let mut toolbox = ToolBox::new();
        toolbox.add(Add);
        toolbox
    }

    #[tokio::test]
    async fn answers_without_tools() {
        let provider = Arc::new(MockProvider::new(vec![MockProvider::text("hello")]));
        let agent = Agent::new("a").provider(provider.clone());

        let result = agent.run("hi").await.unwrap();
        assert_eq!(result.output, "hello");
        assert_eq!(result.steps, 1);
        assert!(result.tool_calls.is_empty());
        assert_eq!(result.items.len(), 2);
        let requests = provider.requests();
        assert_eq!(requests[0].model, "mock-model");
    }

    #[tokio::test]
    async fn executes_calls_and_feeds_outputs_back() {
        let provider = Arc::new(MockProvider::new(vec![
            MockProvider::calls(vec![
                FunctionCall::new("c1", "add", r#"{"a":1,"b":2}"#),
                FunctionCall::new("c2", "add", r#"{"a":3,"b":4}"#),
            ]),
            MockProvider::text("3 and 7"),
        ]));
        let agent = Agent::new("calc")
            .provider(provider.clone())
            .model("gpt-4o")
            .instructions("Use the add tool.")
            .tools(toolbox());

        let result = agent.run("add things").await.unwrap();
        assert_eq!(result.output, "3 and 7");
        assert_eq!(result.steps, 2);
        assert_eq!(result.tool_calls.len(), 2);
        assert_eq!(result.tool_calls[1].output, "7");
        assert_eq!(result.usage.total_tokens, 4);

        let requests = provider.requests();
        let second = &requests[1];
        assert_eq!(second.instructions.as_deref(), Some("Use the add tool."));
        assert_eq!(second.tools.len(), 1);
        let outputs: Vec<_> = second
            .input
            .iter()
            .filter_map(|item| match item {
                Item::Known(KnownItem::FunctionCallOutput { call_id, output }) => {
                    Some((call_id.as_str(), output.as_str()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(outputs, vec![("c1", "3"), ("c2", "7")]);
    }

    #[tokio::test]
    async fn tool_errors_are_reported_to_the_model() {
        let provider = Arc::new(MockProvider::new(vec![
            MockProvider::calls(vec![
                FunctionCall::new("c1", "missing", "{}"),
                FunctionCall::new("c2", "add", "not json"),
            ]),
            MockProvider::text("sorry"),
        ]));
        let agent = Agent::new("a").provider(provider).tools(toolbox());

        let result = agent.run("go").await.unwrap();
        assert_eq!(result.tool_calls[0].output, "Error: Unknown function: missing");
        assert!(!result.tool_calls[1].success);
        assert!(result.tool_calls[1].output.starts_with("Error: Invalid arguments"));
    }

    #[tokio::test]
    async fn sampling_limits_reach_every_request() {
        let provider = Arc::new(MockProvider::new(vec![
            MockProvider::calls(vec![FunctionCall::new("c1", "add", r#"{"a":2,"b":2}"#)]),
            MockProvider::text("4"),
        ]));
        let agent = Agent::new("a")
            .provider(provider.clone())
            .tool(Box::new(Add))
            .max_output_tokens(256)
            .parallel_tool_calls(false);

        agent.run("2+2").await.unwrap();
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            assert_eq!(request.max_output_tokens, Some(256));
            assert_eq!(request.parallel_tool_calls, Some(false));
            assert_eq!(request.tools[0].name, "add");
        }
    }

    #[tokio::test]
    async fn limits_are_omitted_unless_set() {
        let provider = Arc::new(MockProvider::new(vec![MockProvider::text("hi")]));
        Agent::new("a").provider(provider.clone()).run("hi").await.unwrap();
        let requests = provider.requests();
        let body = serde_json::to_value(&requests[0]).unwrap();
        assert!(body.get("max_output_tokens").is_none());
        assert!(body.get("parallel_tool_calls").is_none());
    }

    #[tokio::test]
    async fn step_limit() {
        let looping = MockProvider::calls(vec![FunctionCall::new("c", "add", r#"{"a":0,"b":0}"#)]);
        let provider = Arc::new(MockProvider::new(vec![looping]));
        let agent = Agent::new("a").provider(provider).tools(toolbox()).max_steps(3);

        let err = agent.run("loop").await.unwrap_err();
        assert!(matches!(err, Error::MaxSteps { max_steps: 3 }));
    }

    #[tokio::test]
    async fn missing_provider_is_config_error() {
        let err = Agent::new("lonely").run("hi").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn unknown_output_items_are_echoed() {
        let mut reasoning = Response::default();
        reasoning.output.push(Item::Other(json!({"type": "reasoning", "id": "rs_1"})));
        reasoning
            .output
            .push(FunctionCall::new("c1", "add", r#"{"a":1,"b":1}"#).into());
        let provider = Arc::new(MockProvider::new(vec![reasoning, MockProvider::text("2")]));
        let agent = Agent::new("a").provider(provider.clone()).tools(toolbox());

        agent.run("1+1").await.unwrap();
        let requests = provider.requests();
        let second = &requests[1];
        assert!(second
            .input
            .iter()
            .any(|item| matches!(item, Item::Other(v) if v["id"] == "rs_1")));
    }
}
