//! Schema - Define type schemas for resources
//!
//! Every resource kind and data source publishes a schema: a table of
//! attributes with their type, whether the operator or the server supplies
//! them, defaults, sensitivity and validators. Desired state is checked
//! against it before any remote call is made.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

use crate::resource::Value;

/// Placeholder rendered instead of sensitive values
pub const SENSITIVE_PLACEHOLDER: &str = "(sensitive value)";

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
}

impl AttributeType {
    /// Build an enum type from string literals
    pub fn enumeration(variants: &[&str]) -> Self {
        AttributeType::Enum(variants.iter().map(|v| v.to_string()).collect())
    }

    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}': {inner}")]
    InvalidAttribute { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },
}

impl TypeError {
    /// Name of the offending attribute, if the error is tied to one
    pub fn attribute(&self) -> Option<&str> {
        match self {
            TypeError::MissingRequired { name }
            | TypeError::UnknownAttribute { name }
            | TypeError::InvalidAttribute { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
        }
    }
}

/// Who supplies an attribute's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeMode {
    /// Must be set by the operator
    Required,
    /// May be set by the operator; absent means absent
    Optional,
    /// Set by the server only
    Computed,
    /// May be set by the operator; the server fills it in otherwise
    OptionalComputed,
}

impl AttributeMode {
    pub fn is_configurable(self) -> bool {
        !matches!(self, AttributeMode::Computed)
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub mode: AttributeMode,
    pub sensitive: bool,
    /// Changing this attribute replaces the resource instead of updating it
    pub requires_replace: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            mode: AttributeMode::Optional,
            sensitive: false,
            requires_replace: false,
            default: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.mode = AttributeMode::Required;
        self
    }

    pub fn computed(mut self) -> Self {
        self.mode = AttributeMode::Computed;
        self
    }

    pub fn optional_computed(mut self) -> Self {
        self.mode = AttributeMode::OptionalComputed;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn is_required(&self) -> bool {
        self.mode == AttributeMode::Required
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Fill in defaults for attributes the operator left unset
    pub fn with_defaults(&self, attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
        let mut merged = attributes.clone();
        for (name, schema) in &self.attributes {
            if let Some(default) = &schema.default {
                merged
                    .entry(name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        merged
    }

    /// Validate resource attributes
    ///
    /// Values for computed-only attributes (such as `id`) are tolerated and
    /// ignored, since hosts commonly echo prior state back in the plan.
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        for (name, schema) in &self.attributes {
            if schema.is_required() && !attributes.contains_key(name) && schema.default.is_none() {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        for (name, value) in attributes {
            match self.attributes.get(name) {
                Some(schema) if !schema.mode.is_configurable() => {}
                Some(schema) => {
                    if let Err(e) = schema.attr_type.validate(value) {
                        errors.push(TypeError::InvalidAttribute {
                            name: name.clone(),
                            inner: Box::new(e),
                        });
                    }
                }
                None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            // HashMap iteration order is unstable; keep messages deterministic
            errors.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
            Err(errors)
        }
    }

    /// Copy of the attributes with sensitive values masked, for logs and diffs
    pub fn redact(&self, attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
        attributes
            .iter()
            .map(|(name, value)| {
                let sensitive = self.attributes.get(name).is_some_and(|s| s.sensitive);
                if sensitive {
                    (name.clone(), Value::String(SENSITIVE_PLACEHOLDER.to_string()))
                } else {
                    (name.clone(), value.clone())
                }
            })
            .collect()
    }

    /// Names of attributes whose change forces replacement
    pub fn replace_triggers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .attributes
            .values()
            .filter(|a| a.requires_replace)
            .map(|a| a.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// IP address or CIDR block, IPv4 or IPv6 (e.g., "0.0.0.0/0", "fd00::/8")
    pub fn ip_or_cidr() -> AttributeType {
        AttributeType::Custom {
            name: "IpOrCidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| {
                if let Value::String(s) = value {
                    validate_ip_or_cidr(s)
                } else {
                    Err("Expected string".to_string())
                }
            },
        }
    }

    /// List of strings
    pub fn string_list() -> AttributeType {
        AttributeType::List(Box::new(AttributeType::String))
    }
}

/// Check that a string's length (in characters) is within `min..=max`
pub fn validate_length(value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(format!(
            "string length must be between {} and {}, got {}",
            min, max, len
        ))
    }
}

/// Validate an IP address or CIDR block (e.g., "10.0.0.0/16", "::1")
pub fn validate_ip_or_cidr(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }

    let (ip, prefix) = match value.split_once('/') {
        Some((ip, prefix)) => (ip, Some(prefix)),
        None => (value, None),
    };

    let ip: IpAddr = ip.parse().map_err(|_| {
        format!(
            "Invalid address '{}': expected an IPv4/IPv6 address or CIDR block",
            value
        )
    })?;

    let max_prefix = if ip.is_ipv4() { 32 } else { 128 };
    match prefix {
        None => Ok(()),
        Some(p) => match p.parse::<u8>() {
            Ok(p) if p <= max_prefix => Ok(()),
            Ok(p) => Err(format!(
                "Invalid prefix length '{}': must be 0-{}",
                p, max_prefix
            )),
            Err(_) => Err(format!("Invalid prefix length '{}': must be a number", p)),
        },
    }
}
