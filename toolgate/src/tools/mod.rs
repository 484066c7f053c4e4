//! Built-in toolkits.
//!
//! - [`OperationTool`]: one tool per OpenAPI operation
//! - [`RequestsToolkit`]: raw `requests_*` HTTP tools
//! - [`JsonSpec`]: tools for exploring a JSON document by path

pub mod json_spec;
pub mod openapi;
pub mod requests;

pub use json_spec::{JsonGetValueTool, JsonListKeysTool, JsonSpec};
pub use openapi::OperationTool;
pub use requests::{RequestsTool, RequestsToolkit};
