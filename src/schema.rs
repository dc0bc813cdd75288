//! Input schema construction for the exposed tools

use rmcp::model::Tool;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Builder for a tool definition and its JSON input schema.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    name: String,
    description: String,
    properties: Map<String, Value>,
    required: Vec<Value>,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            properties: Map::new(),
            required: Vec::new(),
        }
    }

    fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(Value::String(name.to_string()));
        }
        self
    }

    pub fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({ "type": "string", "description": description }),
            required,
        )
    }

    pub fn number(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({ "type": "number", "description": description }),
            required,
        )
    }

    /// Optional boolean flag.
    pub fn boolean(self, name: &str, description: &str) -> Self {
        self.property(
            name,
            json!({ "type": "boolean", "description": description }),
            false,
        )
    }

    /// Optional list of strings.
    pub fn string_array(self, name: &str, description: &str) -> Self {
        self.property(
            name,
            json!({
                "type": "array",
                "items": { "type": "string" },
                "description": description,
            }),
            false,
        )
    }

    pub fn enumeration(self, name: &str, description: &str, values: &[&str], required: bool) -> Self {
        self.property(
            name,
            json!({ "type": "string", "enum": values, "description": description }),
            required,
        )
    }

    pub fn build(self) -> Tool {
        let mut input_schema = Map::new();
        input_schema.insert("type".to_string(), Value::String("object".to_string()));
        input_schema.insert("properties".to_string(), Value::Object(self.properties));
        if !self.required.is_empty() {
            input_schema.insert("required".to_string(), Value::Array(self.required));
        }

        Tool::new(self.name, self.description, Arc::new(input_schema))
    }
}
