//! The accumulated trace of one agent run.
//!
//! A run returns its whole decision trace, not a single answer: every model
//! output and every tool invocation with its outcome, in order. The log
//! lives for the duration of one run and is never persisted.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunEntry {
    ModelOutput { content: String },
    ToolInvoked { name: String, arguments: Value },
    ToolResult { name: String, payload: String },
    BudgetExhausted,
}

/// Terminal state of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Done,
    BudgetExhausted,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunLog {
    entries: Vec<RunEntry>,
    state: RunState,
}

impl RunLog {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            state: RunState::Done,
        }
    }

    pub(crate) fn push(&mut self, entry: RunEntry) {
        self.entries.push(entry);
    }

    pub(crate) fn mark_budget_exhausted(&mut self) {
        self.entries.push(RunEntry::BudgetExhausted);
        self.state = RunState::BudgetExhausted;
    }

    pub fn entries(&self) -> &[RunEntry] {
        &self.entries
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Render the full human-readable transcript.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            match entry {
                RunEntry::ModelOutput { content } => {
                    out.push_str(&format!("\n### Model Output:\n\n{content}\n"));
                }
                RunEntry::ToolInvoked { name, arguments } => {
                    out.push_str(&format!("\n### Tool Called: {name} with args: {arguments}\n"));
                }
                RunEntry::ToolResult { name, payload } => {
                    out.push_str(&format!("\n### Tool Result: {name} returned {payload}\n"));
                }
                RunEntry::BudgetExhausted => {
                    out.push_str(
                        "\n### Maximum iterations reached. Stopping further tool calls.\n",
                    );
                }
            }
        }
        out
    }
}

impl fmt::Display for RunLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_entries_in_order() {
        let mut log = RunLog::new();
        log.push(RunEntry::ModelOutput {
            content: "Thought: need the weather".into(),
        });
        log.push(RunEntry::ToolInvoked {
            name: "get_current_weather".into(),
            arguments: json!({"location": "Berlin"}),
        });
        log.push(RunEntry::ToolResult {
            name: "get_current_weather".into(),
            payload: r#"{"error":"timeout"}"#.into(),
        });

        let text = log.render();
        let model_at = text.find("### Model Output:").unwrap();
        let call_at = text
            .find(r#"### Tool Called: get_current_weather with args: {"location":"Berlin"}"#)
            .unwrap();
        let result_at = text.find("### Tool Result: get_current_weather").unwrap();
        assert!(model_at < call_at && call_at < result_at);
        assert_eq!(log.state(), RunState::Done);
    }

    #[test]
    fn budget_note_flips_state() {
        let mut log = RunLog::new();
        log.mark_budget_exhausted();

        assert_eq!(log.state(), RunState::BudgetExhausted);
        assert!(log.render().contains("Maximum iterations reached"));
    }
}
