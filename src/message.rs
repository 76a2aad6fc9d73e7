use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A structured request from the model to invoke a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back on the matching tool message.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub arguments: Value,
}

/// One entry in a run's conversation sequence. The sequence is append-only
/// for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Option<String>,
    /// Tool name, set on tool-role messages only.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tool_call_id: Option<String>,
    /// Calls requested by an assistant message, kept so providers can echo
    /// them back on the next turn.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant message carrying the tool calls the model requested.
    pub fn assistant_with_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            name: None,
            tool_call_id: None,
            tool_calls,
        }
    }

    /// Tool-role result message, correlated with its originating call.
    pub fn tool(
        name: impl Into<String>,
        tool_call_id: Option<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: Some(payload.into()),
            name: Some(name.into()),
            tool_call_id,
            tool_calls: Vec::new(),
        }
    }

    /// ReAct-style observation: the tool result reported back as assistant
    /// text rather than a tool-role message.
    pub fn observation(payload: &str) -> Self {
        Self::plain(Role::Assistant, format!("Observation: {payload}"))
    }

    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_wraps_payload_as_assistant_text() {
        let message = Message::observation(r#"{"error": "timeout"}"#);

        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content_str(), r#"Observation: {"error": "timeout"}"#);
        assert!(message.tool_calls.is_empty());
    }

    #[test]
    fn tool_message_carries_name_and_call_id() {
        let message = Message::tool("get_current_weather", Some("call_0".into()), "{}");

        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.name.as_deref(), Some("get_current_weather"));
        assert_eq!(message.tool_call_id.as_deref(), Some("call_0"));
    }
}
