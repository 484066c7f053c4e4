//! One-stop helper: load a document, convert it, and serve the calls.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::responses::FunctionCall;
use crate::tool::{ToolBox, ToolDefinition};
use crate::tools::OperationTool;

use super::convert::convert;
use super::document::Document;
use super::executor::HttpExecutor;
use super::loader::{SpecLoader, SpecSource, save_functions};

/// Loads an OpenAPI document, turns it into function tools and executes the
/// calls a model makes against the API.
///
/// ```ignore
/// let mut processor = OpenApiProcessor::new(SpecSource::parse("https://api.test/openapi.json"))
///     .with_api_url("https://api.test");
/// let functions = processor.process(true).await?;
/// ```
#[derive(Debug)]
pub struct OpenApiProcessor {
    source: SpecSource,
    api_url: Option<String>,
    headers: Vec<(String, String)>,
    functions_file: Option<PathBuf>,
    raw_spec_file: Option<PathBuf>,
    client: Client,
    document: Option<Arc<Document>>,
    functions: Vec<ToolDefinition>,
    executor: Option<Arc<HttpExecutor>>,
}

impl OpenApiProcessor {
    /// Create a processor for the document at `source`.
    #[must_use]
    pub fn new(source: SpecSource) -> Self {
        Self {
            source,
            api_url: None,
            headers: Vec::new(),
            functions_file: None,
            raw_spec_file: None,
            client: Client::new(),
            document: None,
            functions: Vec::new(),
            executor: None,
        }
    }

    /// Base URL used for calls. Defaults to the document's first server.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Header sent with every API call.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Write the generated definitions to this file on [`process`](Self::process).
    #[must_use]
    pub fn with_functions_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.functions_file = Some(path.into());
        self
    }

    /// Write the loaded document to this file on [`process`](Self::process).
    #[must_use]
    pub fn with_raw_spec_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw_spec_file = Some(path.into());
        self
    }

    /// Use an existing HTTP client for downloads and API calls.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Load the document, convert it and save the configured artifacts.
    pub async fn process(&mut self, strict: bool) -> Result<&[ToolDefinition]> {
        let mut loader = SpecLoader::with_client(self.client.clone());
        if let Some(path) = &self.raw_spec_file {
            loader = loader.with_save_path(path);
        }
        let document = loader.load(&self.source).await?;
        let functions = convert(&document, strict)?;

        if let Some(path) = &self.functions_file {
            save_functions(path, &functions).await?;
        }
        info!(
            source = %self.source,
            functions = functions.len(),
            strict,
            "processed OpenAPI document"
        );

        self.executor = self.build_executor(&document)?.map(Arc::new);
        self.document = Some(Arc::new(document));
        self.functions = functions;
        Ok(&self.functions)
    }

    fn build_executor(&self, document: &Document) -> Result<Option<HttpExecutor>> {
        let executor = match (&self.api_url, document.base_url()) {
            (Some(url), _) => HttpExecutor::with_client(url, self.client.clone())?,
            (None, Some(url)) => match HttpExecutor::with_client(url, self.client.clone()) {
                Ok(executor) => executor,
                Err(e) => {
                    warn!(error = %e, "ignoring unusable server URL");
                    return Ok(None);
                }
            },
            (None, None) => return Ok(None),
        };
        self.headers
            .iter()
            .try_fold(executor, |executor, (name, value)| executor.with_header(name, value))
            .map(Some)
    }

    /// The loaded document, once processed.
    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        self.document.as_deref()
    }

    /// The generated definitions; empty until processed.
    #[must_use]
    pub fn functions(&self) -> &[ToolDefinition] {
        &self.functions
    }

    /// Execute a function call made by the model.
    pub async fn execute(&self, call: &FunctionCall) -> Result<Value> {
        let (document, executor) = self.ready()?;
        Ok(executor.execute_call(document, call).await?)
    }

    /// One tool per generated function, all sharing this processor's executor.
    pub fn toolbox(&self) -> Result<ToolBox> {
        let (document, executor) = self.ready()?;
        Ok(self
            .functions
            .iter()
            .map(|definition| {
                OperationTool::new(definition.clone(), Arc::clone(document), Arc::clone(executor))
                    .boxed()
            })
            .collect())
    }

    fn ready(&self) -> Result<(&Arc<Document>, &Arc<HttpExecutor>)> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| Error::config("OpenAPI document not processed yet"))?;
        let executor = self.executor.as_ref().ok_or_else(|| {
            Error::config("no API URL: pass one explicitly or declare a server in the document")
        })?;
        Ok((document, executor))
    }
}
