//! Declared option schemas for generator backends
//!
//! A backend can declare which options it accepts; the dispatcher
//! validates the task's opaque option bag against the declaration before
//! any side effect occurs. Validation collects every problem instead of
//! stopping at the first one.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Primitive option value types a schema can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Bool,
    Number,
    Array,
    Object,
}

impl PropertyType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            PropertyType::String => value.is_string(),
            PropertyType::Bool => value.is_boolean(),
            PropertyType::Number => value.is_number(),
            PropertyType::Array => value.is_array(),
            PropertyType::Object => value.is_object(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Bool => "boolean",
            PropertyType::Number => "number",
            PropertyType::Array => "array",
            PropertyType::Object => "object",
        }
    }
}

/// One validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    MissingRequired { key: String },
    WrongType { key: String, expected: &'static str },
    UnknownKey { key: String },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::MissingRequired { key } => {
                write!(f, "missing required option '{}'", key)
            }
            SchemaViolation::WrongType { key, expected } => {
                write!(f, "option '{}' must be a {}", key, expected)
            }
            SchemaViolation::UnknownKey { key } => write!(f, "unknown option '{}'", key),
        }
    }
}

/// A backend's declared options: required keys, per-property types, and
/// whether keys outside the declaration are rejected.
#[derive(Debug, Clone, Default)]
pub struct OptionsSchema {
    required: Vec<String>,
    properties: IndexMap<String, PropertyType>,
    closed: bool,
}

impl OptionsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, key: &str, kind: PropertyType) -> Self {
        self.required.push(key.to_string());
        self.properties.insert(key.to_string(), kind);
        self
    }

    pub fn optional(mut self, key: &str, kind: PropertyType) -> Self {
        self.properties.insert(key.to_string(), kind);
        self
    }

    /// Reject keys outside the declared property set.
    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    /// Validate an option bag, returning every violation found.
    pub fn validate(&self, options: &serde_json::Map<String, Value>) -> Vec<SchemaViolation> {
        let mut violations = Vec::new();
        for key in &self.required {
            if !options.contains_key(key) {
                violations.push(SchemaViolation::MissingRequired { key: key.clone() });
            }
        }
        for (key, value) in options {
            match self.properties.get(key) {
                Some(kind) if !kind.matches(value) => {
                    violations.push(SchemaViolation::WrongType { key: key.clone(), expected: kind.name() });
                }
                Some(_) => {}
                None if self.closed => {
                    violations.push(SchemaViolation::UnknownKey { key: key.clone() });
                }
                None => {}
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_valid_options_produce_no_violations() {
        let schema = OptionsSchema::new()
            .required("generatorType", PropertyType::String)
            .optional("skipValidateSpec", PropertyType::Bool);
        let violations =
            schema.validate(&bag(json!({"generatorType": "typescript-axios", "skipValidateSpec": true})));
        assert!(violations.is_empty());
    }

    #[test]
    fn test_missing_required_key_is_reported() {
        let schema = OptionsSchema::new().required("command", PropertyType::String);
        let violations = schema.validate(&bag(json!({})));
        assert_eq!(violations, vec![SchemaViolation::MissingRequired { key: "command".into() }]);
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let schema = OptionsSchema::new().optional("args", PropertyType::Array);
        let violations = schema.validate(&bag(json!({"args": "not-an-array"})));
        assert_eq!(
            violations,
            vec![SchemaViolation::WrongType { key: "args".into(), expected: "array" }]
        );
    }

    #[test]
    fn test_closed_schema_rejects_unknown_keys() {
        let schema = OptionsSchema::new().optional("config", PropertyType::String).closed();
        let violations = schema.validate(&bag(json!({"config": "x", "mystery": 1})));
        assert_eq!(violations, vec![SchemaViolation::UnknownKey { key: "mystery".into() }]);
    }

    #[test]
    fn test_all_violations_are_collected() {
        let schema = OptionsSchema::new()
            .required("command", PropertyType::String)
            .optional("args", PropertyType::Array)
            .closed();
        let violations = schema.validate(&bag(json!({"args": 42, "extra": true})));
        assert_eq!(violations.len(), 3);
    }
}
