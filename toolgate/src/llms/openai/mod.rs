//! OpenAI Responses API client.

mod client;
mod config;

pub use client::OpenAI;
pub use config::OpenAIConfig;
