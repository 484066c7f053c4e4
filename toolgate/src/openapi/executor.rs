//! Executing function calls as HTTP requests against the described API.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result, ToolError};
use crate::responses::FunctionCall;
use crate::tool::ToolResult;

use super::convert::{REQUEST_BODY, render_scalar};
use super::document::{Document, OperationRef};

/// Sends the requests that back the converted function tools.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    base_url: Url,
    client: Client,
    default_headers: HeaderMap,
}

impl HttpExecutor {
    /// Create an executor for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Self::with_client(base_url, client)
    }

    /// Create an executor sharing an existing HTTP client.
    ///
    /// Operation paths are appended to the path of `base_url`, so
    /// `https://host/api/v3` with `/films` calls `https://host/api/v3/films`.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| Error::config(format!("invalid API URL '{base_url}': {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            client,
            default_headers: HeaderMap::new(),
        })
    }

    /// Add a header sent with every request, e.g. an API key.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| Error::config(format!("invalid value for header '{name}': {e}")))?;
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::config(format!("invalid header name '{name}': {e}")))?;
        self.default_headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Root URL of the API.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Execute the operation exposed as `name` with the model's arguments.
    pub async fn execute(&self, document: &Document, name: &str, arguments: Value) -> ToolResult<Value> {
        let op = document
            .find_operation(name)
            .ok_or_else(|| ToolError::not_found(name))?;
        let args = into_object(arguments)?;
        self.send(&op, args).await
    }

    /// Execute a function call taken from model output.
    pub async fn execute_call(&self, document: &Document, call: &FunctionCall) -> ToolResult<Value> {
        let arguments = call.parse_arguments()?;
        self.execute(document, &call.name, arguments).await
    }

    async fn send(&self, op: &OperationRef<'_>, mut args: Map<String, Value>) -> ToolResult<Value> {
        let path = substitute_path(op.path, &mut args);
        let body = args.shift_remove(REQUEST_BODY);

        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ToolError::execution(format!("invalid URL for '{path}': {e}")))?;
        append_query(&mut url, &args);

        debug!(method = %op.method, url = %url, "calling API operation");

        let mut request = self
            .client
            .request(op.method.into(), url)
            .headers(self.default_headers.clone());
        match body {
            Some(body) if op.method.has_body() => request = request.json(&body),
            Some(_) => warn!(method = %op.method, "ignoring requestBody for method without body"),
            None => {}
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ToolError::http(status.as_u16(), text));
        }
        Ok(parse_body(text))
    }
}

/// Accept an argument object, or a JSON string encoding one.
fn into_object(arguments: Value) -> ToolResult<Map<String, Value>> {
    let arguments = match arguments {
        Value::String(text) if text.trim().is_empty() => Value::Object(Map::new()),
        Value::String(text) => serde_json::from_str(&text)?,
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    match arguments {
        Value::Object(map) => Ok(map),
        other => Err(ToolError::invalid_args(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Replace `{name}` placeholders with percent-encoded argument values,
/// removing consumed arguments from `args`.
fn substitute_path(template: &str, args: &mut Map<String, Value>) -> String {
    let mut path = template.to_owned();
    let consumed: Vec<String> = args
        .keys()
        .filter(|name| template.contains(&format!("{{{name}}}")))
        .cloned()
        .collect();
    for name in consumed {
        if let Some(value) = args.shift_remove(&name) {
            let encoded = urlencoding::encode(&render_scalar(&value)).into_owned();
            path = path.replace(&format!("{{{name}}}"), &encoded);
        }
    }
    path
}

fn append_query(url: &mut Url, args: &Map<String, Value>) {
    let mut pairs: Vec<(&str, String)> = Vec::new();
    for (name, value) in args {
        match value {
            Value::Null => {}
            Value::Array(items) => pairs.extend(
                items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| (name.as_str(), render_scalar(v))),
            ),
            other => pairs.push((name.as_str(), render_scalar(other))),
        }
    }
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
}

fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn films_doc() -> Document {
        Document::from_value(json!({
            "openapi": "3.0.0",
            "paths": {
                "/films": {
                    "get": {"operationId": "listFilms"},
                    "post": {"operationId": "createFilm"}
                },
                "/films/{film_id}": {
                    "get": {"operationId": "getFilm"},
                    "delete": {"operationId": "deleteFilm"}
                },
                "/health": {"get": {"operationId": "health"}}
            }
        }))
        .unwrap()
    }

    mod helpers {
        use super::*;

        #[test]
        fn substitutes_and_consumes_path_arguments() {
            let mut args = json!({"film_id": "a b/c", "limit": 3})
                .as_object()
                .cloned()
                .unwrap();
            let path = substitute_path("/films/{film_id}", &mut args);
            assert_eq!(path, "/films/a%20b%2Fc");
            assert!(!args.contains_key("film_id"));
            assert!(args.contains_key("limit"));
        }

        #[test]
        fn query_renders_scalars_and_repeats_arrays() {
            let mut url = Url::parse("http://api.test/films").unwrap();
            let args = json!({"q": "star wars", "limit": 2, "skip": null, "tag": ["a", "b"], "new": true});
            append_query(&mut url, args.as_object().unwrap());
            assert_eq!(url.query(), Some("q=star+wars&limit=2&tag=a&tag=b&new=true"));
        }

        #[test]
        fn arguments_may_be_json_text() {
            assert_eq!(
                into_object(json!("{\"a\":1}")).unwrap(),
                json!({"a": 1}).as_object().cloned().unwrap()
            );
            assert!(into_object(json!("")).unwrap().is_empty());
            assert!(matches!(
                into_object(json!([1])),
                Err(ToolError::InvalidArguments(_))
            ));
        }

        #[test]
        fn non_json_body_becomes_string() {
            assert_eq!(parse_body("ok".to_owned()), json!("ok"));
            assert_eq!(parse_body("[1]".to_owned()), json!([1]));
        }
    }

    mod execute {
        use super::*;

        #[tokio::test]
        async fn get_with_path_and_query() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/films/42"))
                .and(query_param("lang", "en"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42})))
                .expect(1)
                .mount(&server)
                .await;

            let executor = HttpExecutor::new(&server.uri()).unwrap();
            let out = executor
                .execute(&films_doc(), "getFilm", json!({"film_id": 42, "lang": "en"}))
                .await
                .unwrap();
            assert_eq!(out, json!({"id": 42}));
        }

        #[tokio::test]
        async fn post_sends_request_body_and_headers() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/films"))
                .and(header("x-api-key", "secret"))
                .and(body_json(json!({"title": "Alien"})))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
                .expect(1)
                .mount(&server)
                .await;

            let executor = HttpExecutor::new(&server.uri())
                .unwrap()
                .with_header("X-API-KEY", "secret")
                .unwrap();
            let out = executor
                .execute(&films_doc(), "createFilm", json!({"requestBody": {"title": "Alien"}}))
                .await
                .unwrap();
            assert_eq!(out, json!({"id": 1}));
        }

        #[tokio::test]
        async fn operation_path_is_appended_to_base_path() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/api/v1/health"))
                .respond_with(ResponseTemplate::new(200).set_body_string("up"))
                .expect(2)
                .mount(&server)
                .await;

            for base in [format!("{}/api/v1", server.uri()), format!("{}/api/v1/", server.uri())] {
                let executor = HttpExecutor::new(&base).unwrap();
                assert_eq!(executor.base_url().path(), "/api/v1/");
                let out = executor.execute(&films_doc(), "health", json!({})).await.unwrap();
                assert_eq!(out, json!("up"));
            }
        }

        #[tokio::test]
        async fn error_status_is_reported() {
            let server = MockServer::start().await;
            Mock::given(method("DELETE"))
                .and(path("/films/7"))
                .respond_with(ResponseTemplate::new(404).set_body_string("no such film"))
                .mount(&server)
                .await;

            let executor = HttpExecutor::new(&server.uri()).unwrap();
            let err = executor
                .execute(&films_doc(), "deleteFilm", json!({"film_id": "7"}))
                .await
                .unwrap_err();
            assert!(matches!(err, ToolError::Http { status: 404, ref body } if body == "no such film"));
        }

        #[tokio::test]
        async fn unknown_function() {
            let executor = HttpExecutor::new("http://api.test").unwrap();
            let err = executor
                .execute(&films_doc(), "rateFilm", json!({}))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Unknown function: rateFilm");
        }

        #[tokio::test]
        async fn execute_call_parses_arguments() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/films"))
                .and(query_param("limit", "5"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
                .mount(&server)
                .await;

            let executor = HttpExecutor::new(&server.uri()).unwrap();
            let call = FunctionCall::new("call_1", "listFilms", r#"{"limit":5,"after":null}"#);
            let out = executor.execute_call(&films_doc(), &call).await.unwrap();
            assert_eq!(out, json!([]));
        }
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(HttpExecutor::new("not a url"), Err(Error::Config(_))));
    }
}
