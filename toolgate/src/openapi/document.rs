//! Lenient typed view over an OpenAPI 3.x document.
//!
//! Only the parts needed to describe and call operations are modelled;
//! everything else stays reachable through [`Document::raw`]. Key order of
//! `paths` follows the source document.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::OpenApiError;

/// Maximum number of `$ref` hops before a chain is treated as cyclic.
const MAX_REF_DEPTH: usize = 32;

/// HTTP methods an OpenAPI path item can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `PATCH`
    Patch,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
    /// `TRACE`
    Trace,
}

impl Method {
    /// All methods, in the order operations are enumerated.
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Patch,
        Self::Head,
        Self::Options,
        Self::Trace,
    ];

    /// Lowercase name as used for OpenAPI keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
            Self::Head => "head",
            Self::Options => "options",
            Self::Trace => "trace",
        }
    }

    /// Whether a JSON request body is sent for this method.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.as_str().to_ascii_uppercase())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
            Method::Trace => Self::TRACE,
        }
    }
}

/// Either an inline object or a `$ref` to one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// `{"$ref": "#/components/..."}`
    Ref {
        /// The JSON reference.
        #[serde(rename = "$ref")]
        reference: String,
    },
    /// The object itself.
    Item(T),
}

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Templated into the path.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
    /// Anything else (e.g. Swagger 2 `body`/`formData`).
    #[serde(other)]
    Other,
}

/// An operation parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Location of the parameter.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Human readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the parameter must be supplied.
    #[serde(default)]
    pub required: bool,
    /// JSON schema of the value.
    #[serde(default)]
    pub schema: Option<Value>,
}

/// An operation request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    /// Human readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the body must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Media type → payload description.
    #[serde(default)]
    pub content: Map<String, Value>,
}

impl RequestBody {
    /// Schema of the JSON payload, if the body accepts JSON.
    ///
    /// An exact `application/json` entry wins over other JSON media types
    /// (`application/json; charset=utf-8`, `application/problem+json`).
    #[must_use]
    pub fn json_schema(&self) -> Option<&Value> {
        let media = self.content.get("application/json").or_else(|| {
            self.content
                .iter()
                .find(|(name, _)| name.starts_with("application/json") || name.ends_with("+json"))
                .map(|(_, media)| media)
        })?;
        media.get("schema")
    }
}

/// An API operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    /// Unique operation identifier.
    #[serde(default, rename = "operationId")]
    pub operation_id: Option<String>,
    /// Short summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Long description.
    #[serde(default)]
    pub description: Option<String>,
    /// Operation-level parameters.
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
    /// Request body.
    #[serde(default, rename = "requestBody")]
    pub request_body: Option<RefOr<RequestBody>>,
}

/// The operations available on a single path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    /// `GET` operation.
    #[serde(default)]
    pub get: Option<Operation>,
    /// `POST` operation.
    #[serde(default)]
    pub post: Option<Operation>,
    /// `PUT` operation.
    #[serde(default)]
    pub put: Option<Operation>,
    /// `DELETE` operation.
    #[serde(default)]
    pub delete: Option<Operation>,
    /// `PATCH` operation.
    #[serde(default)]
    pub patch: Option<Operation>,
    /// `HEAD` operation.
    #[serde(default)]
    pub head: Option<Operation>,
    /// `OPTIONS` operation.
    #[serde(default)]
    pub options: Option<Operation>,
    /// `TRACE` operation.
    #[serde(default)]
    pub trace: Option<Operation>,
    /// Parameters shared by every operation on the path.
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter>>,
}

impl PathItem {
    /// The operation declared for `method`, if any.
    #[must_use]
    pub const fn operation(&self, method: Method) -> Option<&Operation> {
        match method {
            Method::Get => self.get.as_ref(),
            Method::Post => self.post.as_ref(),
            Method::Put => self.put.as_ref(),
            Method::Delete => self.delete.as_ref(),
            Method::Patch => self.patch.as_ref(),
            Method::Head => self.head.as_ref(),
            Method::Options => self.options.as_ref(),
            Method::Trace => self.trace.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Server {
    url: String,
}

/// A borrowed operation together with where it lives.
#[derive(Debug, Clone, Copy)]
pub struct OperationRef<'a> {
    /// Path template, e.g. `/films/{id}`.
    pub path: &'a str,
    /// HTTP method.
    pub method: Method,
    /// The operation.
    pub operation: &'a Operation,
    /// The enclosing path item.
    pub path_item: &'a PathItem,
}

impl OperationRef<'_> {
    /// Name under which the operation is exposed as a function.
    ///
    /// The `operationId` when present, otherwise `<method>_<path>` with every
    /// non-alphanumeric character replaced by `_`.
    #[must_use]
    pub fn function_name(&self) -> String {
        match self.operation.operation_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => {
                let path: String = self
                    .path
                    .trim_matches('/')
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                    .collect();
                format!("{}_{}", self.method.as_str(), path.trim_matches('_'))
            }
        }
    }

    /// Operation description, falling back to its summary.
    #[must_use]
    pub fn description(&self) -> &str {
        self.operation
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(self.operation.summary.as_deref())
            .unwrap_or_default()
    }
}

/// A parsed OpenAPI document.
#[derive(Debug, Clone)]
pub struct Document {
    raw: Value,
    paths: Vec<(String, PathItem)>,
    servers: Vec<Server>,
}

impl Document {
    /// Interpret a JSON value as an OpenAPI document.
    pub fn from_value(raw: Value) -> Result<Self, OpenApiError> {
        let root = raw
            .as_object()
            .ok_or_else(|| OpenApiError::invalid("document root must be an object"))?;

        let paths = match root.get("paths") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(paths)) => paths
                .iter()
                .map(|(path, item)| {
                    PathItem::deserialize(item)
                        .map(|item| (path.clone(), item))
                        .map_err(|e| OpenApiError::invalid(format!("path '{path}': {e}")))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(OpenApiError::invalid("'paths' must be an object")),
        };

        let servers = match root.get("servers") {
            Some(servers) => Vec::<Server>::deserialize(servers)
                .map_err(|e| OpenApiError::invalid(format!("servers: {e}")))?,
            None => Vec::new(),
        };

        Ok(Self {
            raw,
            paths,
            servers,
        })
    }

    /// Parse a document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, OpenApiError> {
        let raw: Value =
            serde_json::from_str(text).map_err(|e| OpenApiError::invalid(e.to_string()))?;
        Self::from_value(raw)
    }

    /// The document as it was loaded.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Path items in document order.
    #[must_use]
    pub fn paths(&self) -> &[(String, PathItem)] {
        &self.paths
    }

    /// URL of the first declared server, if any.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.servers.first().map(|s| s.url.as_str())
    }

    /// Every operation, paths in document order and methods in [`Method::ALL`] order.
    pub fn operations(&self) -> impl Iterator<Item = OperationRef<'_>> {
        self.paths.iter().flat_map(|(path, item)| {
            Method::ALL.into_iter().filter_map(move |method| {
                item.operation(method).map(|operation| OperationRef {
                    path,
                    method,
                    operation,
                    path_item: item,
                })
            })
        })
    }

    /// Find the operation exposed under `name` (see [`OperationRef::function_name`]).
    #[must_use]
    pub fn find_operation(&self, name: &str) -> Option<OperationRef<'_>> {
        self.operations().find(|op| op.function_name() == name)
    }

    /// Follow a local reference (`#/...`) to the value it designates.
    ///
    /// Chains of references are followed; cycles and references that leave
    /// the document are errors.
    pub fn lookup(&self, reference: &str) -> Result<&Value, OpenApiError> {
        let mut seen = HashSet::new();
        let mut current = reference;
        loop {
            if !seen.insert(current) || seen.len() > MAX_REF_DEPTH {
                return Err(OpenApiError::unresolved(format!("{reference} (cyclic)")));
            }
            let pointer = current
                .strip_prefix('#')
                .ok_or_else(|| OpenApiError::unresolved(current.to_owned()))?;
            let value = self
                .raw
                .pointer(pointer)
                .ok_or_else(|| OpenApiError::unresolved(current.to_owned()))?;
            match value.get("$ref").and_then(Value::as_str) {
                Some(next) => current = next,
                None => return Ok(value),
            }
        }
    }

    /// Resolve a possibly referenced object into an owned value of `T`.
    pub fn resolve<T>(&self, item: &RefOr<T>) -> Result<T, OpenApiError>
    where
        T: Clone + for<'de> Deserialize<'de>,
    {
        match item {
            RefOr::Item(item) => Ok(item.clone()),
            RefOr::Ref { reference } => T::deserialize(self.lookup(reference)?)
                .map_err(|e| OpenApiError::invalid(format!("{reference}: {e}"))),
        }
    }

    /// Resolve a schema that may itself be a `$ref`.
    pub fn resolve_schema<'a>(&'a self, schema: &'a Value) -> Result<&'a Value, OpenApiError> {
        match schema.get("$ref").and_then(Value::as_str) {
            Some(reference) => self.lookup(reference),
            None => Ok(schema),
        }
    }

    /// Effective parameters of an operation.
    ///
    /// Path-level parameters come first; an operation-level parameter with the
    /// same name and location replaces the path-level one.
    pub fn parameters(&self, op: &OperationRef<'_>) -> Result<Vec<Parameter>, OpenApiError> {
        let mut params: Vec<Parameter> = op
            .path_item
            .parameters
            .iter()
            .map(|p| self.resolve(p))
            .collect::<Result<_, _>>()?;

        for param in &op.operation.parameters {
            let param = self.resolve(param)?;
            match params
                .iter_mut()
                .find(|p| p.name == param.name && p.location == param.location)
            {
                Some(existing) => *existing = param,
                None => params.push(param),
            }
        }
        Ok(params)
    }

    /// Resolved request body of an operation.
    pub fn request_body(&self, op: &OperationRef<'_>) -> Result<Option<RequestBody>, OpenApiError> {
        op.operation
            .request_body
            .as_ref()
            .map(|body| self.resolve(body))
            .transpose()
    }
}

impl TryFrom<Value> for Document {
    type Error = OpenApiError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
