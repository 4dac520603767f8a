//! Tool descriptors and field-level input validation.

use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use serde_json::{Value, json};

use super::error::ToolError;

/// JSON type of an input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
}

impl FieldKind {
    fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// Schema entry for one input field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Reject empty strings.
    pub non_empty: bool,
    pub description: &'static str,
}

impl FieldSpec {
    /// A required, non-empty string field.
    pub fn required_string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
            required: true,
            non_empty: true,
            description,
        }
    }

    fn check(&self, value: Option<&Value>) -> Result<(), ToolError> {
        let value = match value {
            None | Some(Value::Null) if self.required => {
                return Err(ToolError::invalid_arguments(self.name, "is required"));
            }
            None | Some(Value::Null) => return Ok(()),
            Some(v) => v,
        };

        if !self.kind.matches(value) {
            return Err(ToolError::invalid_arguments(
                self.name,
                format!("must be a {}", self.kind.json_type()),
            ));
        }

        if self.non_empty && value.as_str().is_some_and(str::is_empty) {
            return Err(ToolError::invalid_arguments(self.name, "must not be empty"));
        }

        Ok(())
    }
}

/// Immutable description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl ToolDescriptor {
    /// JSON Schema object describing the tool input.
    pub fn input_schema(&self) -> JsonObject {
        let mut properties = serde_json::Map::new();
        for field in &self.fields {
            let mut property = json!({
                "type": field.kind.json_type(),
                "description": field.description,
            });
            if field.non_empty && field.kind == FieldKind::String {
                property["minLength"] = json!(1);
            }
            properties.insert(field.name.to_string(), property);
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), json!(required));
        schema
    }

    /// Create a Tool model for this descriptor (metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.into(),
            description: Some(self.description.into()),
            input_schema: Arc::new(self.input_schema()),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: Some(self.title.to_string()),
        }
    }

    /// Validate raw arguments field by field.
    ///
    /// Returns the arguments unchanged on success. Fields not named in the
    /// descriptor are passed through.
    pub fn validate(&self, arguments: Option<JsonObject>) -> Result<JsonObject, ToolError> {
        let arguments = arguments.unwrap_or_default();
        for field in &self.fields {
            field.check(arguments.get(field.name))?;
        }
        Ok(arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ToolDescriptor {
        ToolDescriptor {
            name: "echo_credential",
            title: "Echo Credential",
            description: "Test tool",
            fields: vec![
                FieldSpec::required_string("address", "Address to look up"),
                FieldSpec {
                    name: "verbose",
                    kind: FieldKind::Boolean,
                    required: false,
                    non_empty: false,
                    description: "More output",
                },
            ],
        }
    }

    fn args(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    #[test]
    fn test_validate_accepts_valid_input() {
        let validated = descriptor()
            .validate(args(json!({ "address": "Beijing", "extra": 1 })))
            .unwrap();
        assert_eq!(validated["address"], "Beijing");
        assert_eq!(validated["extra"], 1);
    }

    #[test]
    fn test_validate_missing_required() {
        let err = descriptor().validate(None).unwrap_err();
        assert!(
            matches!(err, ToolError::InvalidArguments { ref field, ref reason } if field == "address" && reason == "is required")
        );
    }

    #[test]
    fn test_validate_empty_string() {
        let err = descriptor().validate(args(json!({ "address": "" }))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid arguments: field 'address' must not be empty"
        );
    }

    #[test]
    fn test_validate_wrong_type() {
        let err = descriptor()
            .validate(args(json!({ "address": "x", "verbose": "yes" })))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { ref field, .. } if field == "verbose"));
    }

    #[test]
    fn test_input_schema() {
        let schema = descriptor().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["address"]));
        assert_eq!(schema["properties"]["address"]["minLength"], 1);
        assert!(schema["properties"]["verbose"].get("minLength").is_none());
    }

    #[test]
    fn test_to_tool() {
        let tool = descriptor().to_tool();
        assert_eq!(tool.name, "echo_credential");
        assert_eq!(tool.title.as_deref(), Some("Echo Credential"));
    }
}
