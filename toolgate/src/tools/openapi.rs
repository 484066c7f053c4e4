//! Function tools backed by OpenAPI operations.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::openapi::{Document, HttpExecutor};
use crate::tool::{BoxedTool, DynTool, ToolDefinition, ToolResult};

/// Exposes one API operation as a tool.
#[derive(Debug, Clone)]
pub struct OperationTool {
    definition: ToolDefinition,
    document: Arc<Document>,
    executor: Arc<HttpExecutor>,
}

impl OperationTool {
    /// Create a tool for the operation described by `definition`.
    #[must_use]
    pub const fn new(
        definition: ToolDefinition,
        document: Arc<Document>,
        executor: Arc<HttpExecutor>,
    ) -> Self {
        Self {
            definition,
            document,
            executor,
        }
    }

    /// Box the tool for a [`ToolBox`](crate::tool::ToolBox).
    #[must_use]
    pub fn boxed(self) -> BoxedTool {
        Box::new(self)
    }
}

#[async_trait]
impl DynTool for OperationTool {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn call_json(&self, args: Value) -> ToolResult<Value> {
        self.executor
            .execute(&self.document, &self.definition.name, args)
            .await
    }
}
