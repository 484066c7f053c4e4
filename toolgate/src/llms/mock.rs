//! Scripted provider for tests.
//!
//! Returns predefined responses in sequence, cycling through them, and
//! records every request it receives.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{LlmError, Result};
use crate::responses::{
    FunctionCall, Item, KnownItem, MessageContent, Response, ResponseRequest, ResponsesProvider, Role, Usage,
};

/// A provider replaying canned responses.
///
/// ```rust,ignore
/// let provider = MockProvider::new(vec![
///     MockProvider::calls(vec![FunctionCall::new("c1", "listFilms", "{}")]),
///     MockProvider::text("Alien, Heat"),
/// ]);
/// ```
#[derive(Debug)]
pub struct MockProvider {
    model: String,
    responses: Vec<Response>,
    index: AtomicUsize,
    requests: Mutex<Vec<ResponseRequest>>,
}

impl MockProvider {
    /// Create a provider with the given script.
    #[must_use]
    pub fn new(responses: Vec<Response>) -> Self {
        Self {
            model: "mock-model".to_owned(),
            responses,
            index: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Set the default model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// A response with a single assistant message.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Response {
        Self::response(vec![Item::Known(KnownItem::Message {
            id: None,
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
            status: None,
        })])
    }

    /// A response requesting function calls.
    #[must_use]
    pub fn calls(calls: Vec<FunctionCall>) -> Response {
        Self::response(calls.into_iter().map(Item::from).collect())
    }

    fn response(output: Vec<Item>) -> Response {
        Response {
            id: "resp_mock".to_owned(),
            model: "mock-model".to_owned(),
            status: Some("completed".to_owned()),
            output,
            usage: Some(Usage {
                input_tokens: 1,
                output_tokens: 1,
                total_tokens: 2,
            }),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ResponseRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ResponsesProvider for MockProvider {
    async fn create(&self, request: &ResponseRequest) -> Result<Response> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if self.responses.is_empty() {
            return Err(LlmError::internal("mock provider has no responses").into());
        }
        let index = self.index.fetch_add(1, Ordering::SeqCst);
        Ok(self.responses[index % self.responses.len()].clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}
