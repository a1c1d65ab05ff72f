//! Parameter schemas and argument validation.
//!
//! A [`ParameterSchema`] is the structural description of the arguments a
//! capability accepts: per-property types, an optional enum of allowed
//! values, and a list of required properties. It renders to the familiar
//! JSON-schema object shape for the routing layer, and validates inbound
//! arguments before the handler ever runs.
//!
//! Unknown properties are passed through untouched; the handler decides what
//! to do with them.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::error::{CapabilityError, CapabilityResult};

/// The JSON type a property must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// A JSON string.
    String,
    /// A JSON integer (no fractional part).
    Integer,
    /// Any JSON number.
    Number,
    /// A JSON boolean.
    Boolean,
    /// A JSON array.
    Array,
    /// A JSON object.
    Object,
}

impl ParamType {
    /// The JSON-schema name of this type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Check whether `value` has this type.
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// Schema for a single property.
#[derive(Debug, Clone)]
pub struct PropertySchema {
    kind: ParamType,
    description: String,
    allowed: Option<Vec<Value>>,
}

impl PropertySchema {
    /// A property of the given type.
    #[must_use]
    pub fn new(kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            allowed: None,
        }
    }

    /// A string property.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self::new(ParamType::String, description)
    }

    /// An integer property.
    #[must_use]
    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(ParamType::Integer, description)
    }

    /// A number property.
    #[must_use]
    pub fn number(description: impl Into<String>) -> Self {
        Self::new(ParamType::Number, description)
    }

    /// A boolean property.
    #[must_use]
    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(ParamType::Boolean, description)
    }

    /// Restrict the property to a fixed set of allowed values.
    #[must_use]
    pub fn with_enum(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.allowed = Some(values.into_iter().collect());
        self
    }

    /// Convenience for string enums.
    #[must_use]
    pub fn one_of(self, values: impl IntoIterator<Item = &'static str>) -> Self {
        self.with_enum(values.into_iter().map(|v| Value::String(v.to_string())))
    }
}

/// Structural description of a capability's accepted arguments.
#[derive(Debug, Clone, Default)]
pub struct ParameterSchema {
    properties: BTreeMap<String, PropertySchema>,
    required: Vec<String>,
}

impl ParameterSchema {
    /// An empty schema (no declared properties, nothing required).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Mark a declared property as required.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Validate `args` against this schema.
    ///
    /// Accepts `null` as shorthand for an empty object. Checks, in order:
    /// the arguments are an object, every required property is present, and
    /// every declared property that is present has the declared type and
    /// (if an enum is declared) one of the allowed values.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::InvalidArguments`] describing the first
    /// violation found.
    pub fn validate(&self, args: &Value) -> CapabilityResult<()> {
        let invalid = |message: String| CapabilityError::InvalidArguments { message };

        let object = match args {
            Value::Null => {
                if let Some(name) = self.required.first() {
                    return Err(invalid(format!("missing required argument {name:?}")));
                }
                return Ok(());
            },
            Value::Object(map) => map,
            other => {
                return Err(invalid(format!(
                    "arguments must be an object, got {}",
                    json_type_name(other)
                )));
            },
        };

        for name in &self.required {
            if !object.contains_key(name) {
                return Err(invalid(format!("missing required argument {name:?}")));
            }
        }

        for (name, property) in &self.properties {
            let Some(value) = object.get(name) else {
                continue;
            };
            if value.is_null() && !self.required.contains(name) {
                continue;
            }
            if !property.kind.matches(value) {
                return Err(invalid(format!(
                    "argument {name:?} must be a {}, got {}",
                    property.kind.as_str(),
                    json_type_name(value)
                )));
            }
            if let Some(allowed) = &property.allowed
                && !allowed.contains(value)
            {
                return Err(invalid(format!(
                    "argument {name:?} must be one of {allowed:?}"
                )));
            }
        }

        Ok(())
    }

    /// Render the schema as a JSON-schema object for the routing layer.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for (name, property) in &self.properties {
            let mut rendered = serde_json::Map::new();
            rendered.insert("type".to_string(), json!(property.kind.as_str()));
            rendered.insert("description".to_string(), json!(property.description));
            if let Some(allowed) = &property.allowed {
                rendered.insert("enum".to_string(), Value::Array(allowed.clone()));
            }
            properties.insert(name.clone(), Value::Object(rendered));
        }
        json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": self.required,
        })
    }
}

/// Human-readable name of a JSON value's type, for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
