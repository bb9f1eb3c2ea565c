//! Action definition types.

use serde::{Deserialize, Serialize};

/// Discovery metadata for a registered action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique action name; the registry key.
    pub name: String,

    /// Description of what the action does.
    #[serde(default)]
    pub description: String,

    /// JSON Schema for the parameters.
    #[serde(rename = "parameters", skip_serializing_if = "Option::is_none")]
    pub parameters_schema: Option<serde_json::Value>,
}

impl ToolDefinition {
    /// Create a new definition without a schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema: None,
        }
    }

    /// Set the parameters schema.
    pub fn with_parameters_schema(mut self, schema: serde_json::Value) -> Self {
        self.parameters_schema = Some(schema);
        self
    }

    /// Schema to advertise, falling back to an empty object schema.
    pub fn schema_or_empty(&self) -> serde_json::Value {
        self.parameters_schema
            .clone()
            .unwrap_or_else(empty_object_schema)
    }
}

fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
