use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A function call the model asked for in an assistant message.
///
/// `arguments` is kept as parsed JSON; providers that send a JSON string are
/// decoded by the transformer before this is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// What the model is told about a callable tool; `parameters` is a JSON schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Outcome of one tool call as it goes back into the conversation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    /// Serialized tool output
    Output(String),
    /// Why the call failed; the model still gets a reply for the call id
    Failed(String),
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Output(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Output(text) | Self::Failed(text) => text,
        }
    }

    /// Body of the `tool` message; failures are wrapped as `{"error": ...}`
    pub fn to_model_content(&self) -> String {
        match self {
            Self::Output(text) => text.clone(),
            Self::Failed(reason) => serde_json::json!({ "error": reason }).to_string(),
        }
    }
}
