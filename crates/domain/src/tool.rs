use serde::{Deserialize, Serialize};

/// Tool definition exposed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: serde_json::Value,
}

/// Result of a memory tool call: text for the model, details for the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub text: String,
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(text: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            text: text.into(),
            details,
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            details: serde_json::Value::Null,
            is_error: true,
        }
    }
}
