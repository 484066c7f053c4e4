//! Acquiring OpenAPI documents and persisting generated artifacts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{OpenApiError, Result};
use crate::tool::ToolDefinition;

use super::document::Document;

/// Default file name for the downloaded document.
pub const DEFAULT_RAW_SPEC_FILE: &str = "openapi-schema-raw.json";

/// Default file name for the generated function definitions.
pub const DEFAULT_FUNCTIONS_FILE: &str = "openai_functions.json";

/// Where an OpenAPI document comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecSource {
    /// Downloaded with an HTTP `GET`.
    Url(String),
    /// Read from disk.
    File(PathBuf),
    /// Already in memory.
    Inline(Value),
}

impl SpecSource {
    /// Interpret a command-line style location: `http(s)://` is a URL,
    /// anything else a file path.
    #[must_use]
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_owned())
        } else {
            Self::File(PathBuf::from(location))
        }
    }
}

impl fmt::Display for SpecSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline(_) => f.write_str("<inline>"),
        }
    }
}

impl From<Value> for SpecSource {
    fn from(value: Value) -> Self {
        Self::Inline(value)
    }
}

/// Loads OpenAPI documents.
#[derive(Debug, Clone)]
pub struct SpecLoader {
    client: Client,
    save_path: Option<PathBuf>,
}

impl Default for SpecLoader {
    fn default() -> Self {
        Self::with_client(Client::new())
    }
}

impl SpecLoader {
    /// Create a loader with a fresh HTTP client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Create a loader sharing an existing HTTP client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self {
            client,
            save_path: None,
        }
    }

    /// Also write the loaded document, pretty-printed, to `path`.
    #[must_use]
    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    /// Load and parse the document.
    pub async fn load(&self, source: &SpecSource) -> Result<Document> {
        let raw = match source {
            SpecSource::Url(url) => self.fetch(url).await?,
            SpecSource::File(path) => {
                let text = tokio::fs::read_to_string(path).await?;
                serde_json::from_str(&text).map_err(|e| {
                    OpenApiError::invalid(format!("{}: {e}", path.display()))
                })?
            }
            SpecSource::Inline(value) => value.clone(),
        };

        if let Some(path) = &self.save_path {
            write_json(path, &raw).await?;
            info!(path = %path.display(), "saved raw OpenAPI document");
        }

        Ok(Document::from_value(raw)?)
    }

    async fn fetch(&self, url: &str) -> Result<Value> {
        debug!(url, "downloading OpenAPI document");
        let fetch_error = |message: String| OpenApiError::Fetch {
            url: url.to_owned(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status.as_u16())).into());
        }

        let text = response
            .text()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        serde_json::from_str(&text)
            .map_err(|e| fetch_error(format!("response is not JSON: {e}")).into())
    }
}

/// Write function definitions to `path` as a pretty-printed JSON array.
pub async fn save_functions(path: impl AsRef<Path>, functions: &[ToolDefinition]) -> Result<()> {
    let path = path.as_ref();
    write_json(path, functions).await?;
    info!(path = %path.display(), count = functions.len(), "saved function definitions");
    Ok(())
}

/// Read function definitions previously written by [`save_functions`].
pub async fn load_functions(path: impl AsRef<Path>) -> Result<Vec<ToolDefinition>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let text = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, text).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn minimal() -> Value {
        json!({
            "openapi": "3.0.0",
            "paths": {"/films": {"get": {"operationId": "listFilms"}}}
        })
    }

    mod spec_source {
        use super::*;

        #[test]
        fn parse_distinguishes_urls_from_files() {
            assert_eq!(
                SpecSource::parse("https://api.test/openapi.json"),
                SpecSource::Url("https://api.test/openapi.json".to_owned())
            );
            assert_eq!(
                SpecSource::parse("specs/films.json"),
                SpecSource::File(PathBuf::from("specs/films.json"))
            );
        }

        #[test]
        fn display() {
            assert_eq!(SpecSource::Inline(json!({})).to_string(), "<inline>");
        }
    }

    mod loader {
        use super::*;

        #[tokio::test]
        async fn downloads_and_saves_raw_copy() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/openapi.json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(minimal()))
                .mount(&server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let raw_path = dir.path().join(DEFAULT_RAW_SPEC_FILE);
            let loader = SpecLoader::default().with_save_path(&raw_path);

            let source = SpecSource::Url(format!("{}/openapi.json", server.uri()));
            let doc = loader.load(&source).await.unwrap();
            assert!(doc.find_operation("listFilms").is_some());

            let saved: Value =
                serde_json::from_str(&std::fs::read_to_string(&raw_path).unwrap()).unwrap();
            assert_eq!(saved, minimal());
        }

        #[tokio::test]
        async fn non_success_status_is_fetch_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;

            let source = SpecSource::Url(format!("{}/missing.json", server.uri()));
            let err = SpecLoader::default().load(&source).await.unwrap_err();
            assert!(matches!(err, Error::OpenApi(OpenApiError::Fetch { .. })));
            assert!(err.to_string().contains("HTTP 404"));
        }

        #[tokio::test]
        async fn reads_files() {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("spec.json");
            std::fs::write(&file, minimal().to_string()).unwrap();

            let doc = SpecLoader::default()
                .load(&SpecSource::File(file))
                .await
                .unwrap();
            assert_eq!(doc.operations().count(), 1);
        }

        #[tokio::test]
        async fn invalid_file_is_reported() {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("broken.json");
            std::fs::write(&file, "{not json").unwrap();

            let err = SpecLoader::default()
                .load(&SpecSource::File(file))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::OpenApi(OpenApiError::InvalidDocument(_))));
        }
    }

    #[tokio::test]
    async fn functions_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out").join(DEFAULT_FUNCTIONS_FILE);
        let defs = vec![ToolDefinition::new("listFilms", "List films", json!({"type": "object"}))
            .with_strict(false)];

        save_functions(&file, &defs).await.unwrap();
        let text = std::fs::read_to_string(&file).unwrap();
        assert!(text.contains("\n  "));
        assert_eq!(load_functions(&file).await.unwrap(), defs);
    }
}
