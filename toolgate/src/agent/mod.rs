//! Agents that answer prompts by calling tools through a model.

mod config;
mod result;
mod runner;

pub use config::Agent;
pub use result::{RunResult, ToolCallRecord};
