//! Schema type definitions.
//!
//! Supported property types:
//! - string: UTF-8 string
//! - integer: 64-bit signed integer
//! - boolean: true/false
//! - enum: string restricted to a declared membership list
//! - date: calendar date in `YYYY-MM-DD` form
//!
//! A [`Schema`] is an ordered sequence of [`PropertyRule`] values with unique
//! names. Schemas are immutable once built; the factory shares them across
//! DTO instances behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dto::value::{json_type_name, raw_display, Value, DATE_FORMAT};

/// Signature for named custom predicates referenced from schema files.
///
/// A predicate receives the already-coerced value and returns a short
/// human-readable reason on failure.
pub type PredicateFn = dyn Fn(&Value) -> Result<(), String> + Send + Sync;

/// Supported property types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Integer,
    /// Boolean
    Boolean,
    /// String restricted to the declared members
    Enum {
        /// Allowed member values, in declaration order
        values: Vec<String>,
    },
    /// Calendar date, `YYYY-MM-DD`
    Date,
}

impl PropertyType {
    /// Returns the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Integer => "integer",
            PropertyType::Boolean => "boolean",
            PropertyType::Enum { .. } => "enum",
            PropertyType::Date => "date",
        }
    }

    /// Coerces a raw input value to this type.
    ///
    /// Form and body input arrives stringly, so integers and booleans accept
    /// their base-10 / `"true"`-style string renderings in addition to the
    /// native JSON shapes. On failure returns the expected/actual pair used
    /// to build the violation message.
    pub fn coerce(&self, raw: &serde_json::Value) -> Result<Value, TypeMismatch> {
        match self {
            PropertyType::String => match raw {
                serde_json::Value::String(s) => Ok(Value::String(s.clone())),
                other => Err(self.mismatch(other)),
            },
            PropertyType::Integer => match raw {
                serde_json::Value::Number(n) => n
                    .as_i64()
                    .map(Value::Integer)
                    .ok_or_else(|| self.mismatch(raw)),
                serde_json::Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|_| self.mismatch(raw)),
                other => Err(self.mismatch(other)),
            },
            PropertyType::Boolean => match raw {
                serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
                serde_json::Value::String(s) => match s.as_str() {
                    "true" | "1" => Ok(Value::Boolean(true)),
                    "false" | "0" => Ok(Value::Boolean(false)),
                    _ => Err(self.mismatch(raw)),
                },
                other => Err(self.mismatch(other)),
            },
            PropertyType::Enum { values } => match raw {
                serde_json::Value::String(s) if values.contains(s) => {
                    Ok(Value::String(s.clone()))
                }
                other => Err(TypeMismatch {
                    expected: format!("one of [{}]", values.join(", ")),
                    actual: actual_of(other),
                }),
            },
            PropertyType::Date => match raw {
                serde_json::Value::String(s) => {
                    chrono::NaiveDate::parse_from_str(s, DATE_FORMAT)
                        .map(Value::Date)
                        .map_err(|_| TypeMismatch {
                            expected: "date in YYYY-MM-DD form".to_string(),
                            actual: raw_display(raw),
                        })
                }
                other => Err(self.mismatch(other)),
            },
        }
    }

    fn mismatch(&self, raw: &serde_json::Value) -> TypeMismatch {
        TypeMismatch {
            expected: self.type_name().to_string(),
            actual: actual_of(raw),
        }
    }
}

fn actual_of(raw: &serde_json::Value) -> String {
    match raw {
        serde_json::Value::String(_) => raw_display(raw),
        other => format!("{} ({})", raw_display(other), json_type_name(other)),
    }
}

/// Expected/actual pair produced by a failed coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    /// What the schema declares
    pub expected: String,
    /// What the input carried
    pub actual: String,
}

/// One validation check in a property's ordered constraint chain.
#[derive(Clone)]
pub enum Constraint {
    /// Minimum string length in characters
    MinLength(usize),
    /// Maximum string length in characters
    MaxLength(usize),
    /// Regex the full string value must match
    Pattern(regex::Regex),
    /// Inclusive integer bounds; either side may be open
    Range {
        /// Lower bound, inclusive
        min: Option<i64>,
        /// Upper bound, inclusive
        max: Option<i64>,
    },
    /// String membership list
    OneOf(Vec<String>),
    /// Named custom check, resolved against the loader's registry at parse
    /// time
    Predicate {
        /// Registered predicate name, kept for error messages
        name: String,
        /// Resolved check
        check: Arc<PredicateFn>,
    },
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::MinLength(n) => f.debug_tuple("MinLength").field(n).finish(),
            Constraint::MaxLength(n) => f.debug_tuple("MaxLength").field(n).finish(),
            Constraint::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Constraint::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            Constraint::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Constraint::Predicate { name, .. } => {
                f.debug_struct("Predicate").field("name", name).finish()
            }
        }
    }
}

/// Declarative description of one schema property.
#[derive(Debug, Clone)]
pub struct PropertyRule {
    /// Property name, unique within the schema
    pub name: String,
    /// Declared data type
    pub property_type: PropertyType,
    /// Whether the property must be present at validation time
    pub required: bool,
    /// Ordered constraint chain
    pub constraints: Vec<Constraint>,
    /// Value used when the property is absent and not required
    pub default: Option<Value>,
}

impl PropertyRule {
    /// Create a required property with no constraints.
    pub fn required(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            required: true,
            constraints: Vec::new(),
            default: None,
        }
    }

    /// Create an optional property with no constraints.
    pub fn optional(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            required: false,
            ..Self::required(name, property_type)
        }
    }

    /// Append a constraint to the chain.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// An immutable, named, ordered set of property rules.
#[derive(Debug)]
pub struct Schema {
    name: String,
    properties: Vec<PropertyRule>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Builds a schema from rules in declaration order.
    ///
    /// Property names must be unique; the loader enforces this before
    /// construction, and programmatic callers are expected to do the same.
    pub fn new(name: impl Into<String>, properties: Vec<PropertyRule>) -> Self {
        let index = properties
            .iter()
            .enumerate()
            .map(|(i, rule)| (rule.name.clone(), i))
            .collect::<HashMap<_, _>>();
        debug_assert_eq!(index.len(), properties.len(), "duplicate property name");
        Self {
            name: name.into(),
            properties,
            index,
        }
    }

    /// Returns the DTO name this schema describes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up the rule for a property name.
    pub fn rule(&self, property: &str) -> Option<&PropertyRule> {
        self.index.get(property).map(|&i| &self.properties[i])
    }

    /// Returns whether the schema declares the property.
    pub fn declares(&self, property: &str) -> bool {
        self.index.contains_key(property)
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[PropertyRule] {
        &self.properties
    }

    /// Number of declared properties.
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Schema {
        Schema::new(
            "CreatePost",
            vec![
                PropertyRule::required("title", PropertyType::String),
                PropertyRule::optional("views", PropertyType::Integer),
            ],
        )
    }

    #[test]
    fn test_rule_lookup_preserves_declaration_order() {
        let schema = sample_schema();
        assert_eq!(schema.property_count(), 2);
        assert_eq!(schema.rules()[0].name, "title");
        assert_eq!(schema.rules()[1].name, "views");
        assert!(schema.declares("title"));
        assert!(!schema.declares("body"));
        assert_eq!(schema.rule("views").unwrap().property_type, PropertyType::Integer);
    }

    #[test]
    fn test_coerce_string() {
        assert_eq!(
            PropertyType::String.coerce(&json!("hello")),
            Ok(Value::String("hello".into()))
        );
        assert!(PropertyType::String.coerce(&json!(42)).is_err());
        assert!(PropertyType::String.coerce(&json!(null)).is_err());
    }

    #[test]
    fn test_coerce_integer_accepts_numeric_strings() {
        assert_eq!(PropertyType::Integer.coerce(&json!(42)), Ok(Value::Integer(42)));
        assert_eq!(PropertyType::Integer.coerce(&json!("42")), Ok(Value::Integer(42)));
        assert_eq!(PropertyType::Integer.coerce(&json!(" -7 ")), Ok(Value::Integer(-7)));
        assert!(PropertyType::Integer.coerce(&json!(1.5)).is_err());
        assert!(PropertyType::Integer.coerce(&json!("4x")).is_err());
    }

    #[test]
    fn test_coerce_boolean_accepts_form_strings() {
        assert_eq!(PropertyType::Boolean.coerce(&json!(true)), Ok(Value::Boolean(true)));
        assert_eq!(PropertyType::Boolean.coerce(&json!("1")), Ok(Value::Boolean(true)));
        assert_eq!(PropertyType::Boolean.coerce(&json!("false")), Ok(Value::Boolean(false)));
        assert!(PropertyType::Boolean.coerce(&json!("yes")).is_err());
    }

    #[test]
    fn test_coerce_enum_checks_membership() {
        let ty = PropertyType::Enum {
            values: vec!["draft".into(), "published".into()],
        };
        assert_eq!(ty.coerce(&json!("draft")), Ok(Value::String("draft".into())));

        let err = ty.coerce(&json!("deleted")).unwrap_err();
        assert!(err.expected.contains("draft"));
        assert!(err.actual.contains("deleted"));
    }

    #[test]
    fn test_coerce_date() {
        let coerced = PropertyType::Date.coerce(&json!("2024-03-01")).unwrap();
        assert_eq!(
            coerced.as_date().unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(PropertyType::Date.coerce(&json!("01/03/2024")).is_err());
        assert!(PropertyType::Date.coerce(&json!("2024-13-40")).is_err());
    }

    #[test]
    fn test_mismatch_names_expected_type() {
        let err = PropertyType::Integer.coerce(&json!(true)).unwrap_err();
        assert_eq!(err.expected, "integer");
        assert!(err.actual.contains("boolean"));
    }
}
