//! Toolgate - OpenAPI documents as LLM function tools
//!
//! This crate turns the operations of an OpenAPI document into Responses-API
//! function definitions, executes the function calls a model makes against the
//! live API, and drives a bounded agent loop over those tools.

pub mod agent;
pub mod error;
pub mod llms;
#[cfg(feature = "mcp")]
pub mod mcp;
pub mod openapi;
pub mod prelude;
pub mod responses;
pub mod tool;
pub mod tools;

pub use error::{Error, LlmError, OpenApiError, Result, ToolError};
