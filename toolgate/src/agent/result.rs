//! Agent run result types.

use std::fmt::Write as _;

use serde::Serialize;

use crate::responses::{Item, Usage};

/// One executed function call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCallRecord {
    /// Call id assigned by the model.
    pub call_id: String,
    /// Tool name.
    pub name: String,
    /// Arguments as sent by the model.
    pub arguments: String,
    /// Output reported back to the model.
    pub output: String,
    /// Whether the tool succeeded.
    pub success: bool,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Final text answer.
    pub output: String,
    /// Number of model round-trips.
    pub steps: usize,
    /// Every function call executed, in order.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Accumulated token usage.
    pub usage: Usage,
    /// Full conversation, including the model's output items.
    pub items: Vec<Item>,
}

impl RunResult {
    /// Human-readable summary of the run.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = String::with_capacity(256);
        let _ = writeln!(summary, "Steps: {}", self.steps);
        let _ = writeln!(
            summary,
            "Tokens: {} (in: {}, out: {})",
            self.usage.total_tokens, self.usage.input_tokens, self.usage.output_tokens
        );
        for call in &self.tool_calls {
            let status = if call.success { "ok" } else { "failed" };
            let _ = writeln!(summary, "Call: {}({}) {status}", call.name, call.arguments);
        }
        let _ = writeln!(summary, "Output: {}", self.output);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_calls() {
        let result = RunResult {
            output: "done".to_owned(),
            steps: 2,
            tool_calls: vec![ToolCallRecord {
                call_id: "c1".to_owned(),
                name: "listFilms".to_owned(),
                arguments: "{}".to_owned(),
                output: "[]".to_owned(),
                success: true,
            }],
            usage: Usage {
                input_tokens: 7,
                output_tokens: 3,
                total_tokens: 10,
            },
            items: Vec::new(),
        };
        let summary = result.summary();
        assert!(summary.contains("Steps: 2"));
        assert!(summary.contains("Tokens: 10 (in: 7, out: 3)"));
        assert!(summary.contains("Call: listFilms({}) ok"));
        assert!(summary.ends_with("Output: done\n"));
    }
}
