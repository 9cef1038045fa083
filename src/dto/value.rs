//! Typed property values and coercion from raw request input.
//!
//! Raw input reaches the engine as `serde_json::Value` (decoded form or body
//! data), which means numbers and booleans frequently arrive as strings.
//! Coercion accepts the stringly forms; anything else is a type mismatch
//! reported against the declared property type.

use std::fmt;

use chrono::NaiveDate;

/// Date format accepted for `date` properties.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A coerced, schema-typed property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// UTF-8 string (also the storage form of enum-typed properties)
    String(String),
    /// 64-bit signed integer
    Integer(i64),
    /// Boolean
    Boolean(bool),
    /// Calendar date, no time component
    Date(NaiveDate),
}

impl Value {
    /// Returns the string content, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content, if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean content, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the date content, if this is a date value.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

/// Returns the JSON type name of a raw input value, for error messages.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "float"
            }
        }
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Short rendering of a raw input value for the "actual" side of a
/// violation message. Strings render with quotes so an empty string is
/// visible in the output.
pub(crate) fn raw_display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}
