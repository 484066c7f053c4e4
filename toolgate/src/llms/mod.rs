//! Model backends.
//!
//! - [`openai`] - OpenAI Responses API
//! - [`MockProvider`] - scripted responses for tests

mod mock;
pub mod openai;

pub use mock::MockProvider;
pub use openai::{OpenAI, OpenAIConfig};
