//! Schema loader: parses declarative schema files into compiled schemas.
//!
//! Loading is two-stage. Stage one is plain serde deserialization of the
//! JSON declaration; stage two compiles regexes, resolves named predicates,
//! coerces default values and rejects structural mistakes (duplicate or
//! empty property names, constraints incompatible with the declared type,
//! defaults that fail their own constraint chain). A schema that fails any
//! stage is never handed to the caller in partial form.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::errors::{SchemaError, SchemaResult};
use super::types::{Constraint, PredicateFn, PropertyRule, PropertyType, Schema};
use crate::dto::validation::first_violation;
use crate::dto::value::Value;

/// Raw schema declaration as it appears on disk.
#[derive(Debug, Deserialize)]
struct SchemaDecl {
    name: String,
    properties: Vec<PropertyDecl>,
}

#[derive(Debug, Deserialize)]
struct PropertyDecl {
    name: String,
    #[serde(flatten)]
    type_decl: TypeDecl,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    constraints: Vec<ConstraintDecl>,
    #[serde(default)]
    default: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TypeDecl {
    String,
    Integer,
    Boolean,
    Enum { values: Vec<String> },
    Date,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ConstraintDecl {
    MinLength(usize),
    MaxLength(usize),
    Pattern(String),
    Range {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    OneOf(Vec<String>),
    Predicate(String),
}

/// Parses schema declaration files and compiles them into [`Schema`] values.
///
/// Custom predicates referenced from schema files must be registered before
/// the referencing schema is loaded; an unknown predicate name is a parse
/// error, not a runtime one.
pub struct SchemaLoader {
    predicates: HashMap<String, Arc<PredicateFn>>,
}

impl SchemaLoader {
    /// Creates a loader with no registered predicates.
    pub fn new() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// Registers a named predicate usable from schema files as
    /// `{ "predicate": "<name>" }`.
    pub fn register_predicate<F>(&mut self, name: impl Into<String>, check: F)
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(check));
    }

    /// Loads and compiles the schema file at `path`.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::NotFound`] when the file does not exist.
    /// - [`SchemaError::Parse`] when the declaration is malformed; the error
    ///   names the file and, where attributable, the property.
    pub fn load(&self, path: &Path) -> SchemaResult<Schema> {
        if !path.exists() {
            return Err(SchemaError::not_found(path));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SchemaError::parse(path, format!("failed to read file: {}", e)))?;

        let decl: SchemaDecl = serde_json::from_str(&content)
            .map_err(|e| SchemaError::parse(path, format!("invalid declaration: {}", e)))?;

        let schema = self.compile(path, decl)?;
        debug!(
            schema = schema.name(),
            path = %path.display(),
            properties = schema.property_count(),
            "schema loaded"
        );
        Ok(schema)
    }

    fn compile(&self, path: &Path, decl: SchemaDecl) -> SchemaResult<Schema> {
        if decl.name.is_empty() {
            return Err(SchemaError::parse(path, "schema name must not be empty"));
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(decl.properties.len());

        for property in decl.properties {
            if property.name.is_empty() {
                return Err(SchemaError::parse(path, "property name must not be empty"));
            }
            if !seen.insert(property.name.clone()) {
                return Err(SchemaError::parse_property(
                    path,
                    &property.name,
                    "duplicate property name",
                ));
            }
            rules.push(self.compile_property(path, property)?);
        }

        Ok(Schema::new(decl.name, rules))
    }

    fn compile_property(&self, path: &Path, decl: PropertyDecl) -> SchemaResult<PropertyRule> {
        let property_type = match decl.type_decl {
            TypeDecl::String => PropertyType::String,
            TypeDecl::Integer => PropertyType::Integer,
            TypeDecl::Boolean => PropertyType::Boolean,
            TypeDecl::Enum { values } => {
                if values.is_empty() {
                    return Err(SchemaError::parse_property(
                        path,
                        &decl.name,
                        "enum membership list must not be empty",
                    ));
                }
                PropertyType::Enum { values }
            }
            TypeDecl::Date => PropertyType::Date,
        };

        let mut constraints = Vec::with_capacity(decl.constraints.len());
        for constraint in decl.constraints {
            constraints.push(self.compile_constraint(path, &decl.name, &property_type, constraint)?);
        }

        let mut rule = PropertyRule {
            name: decl.name,
            property_type,
            required: decl.required,
            constraints,
            default: None,
        };

        if let Some(raw_default) = decl.default {
            rule.default = Some(self.compile_default(path, &rule, &raw_default)?);
        }

        Ok(rule)
    }

    fn compile_constraint(
        &self,
        path: &Path,
        property: &str,
        property_type: &PropertyType,
        decl: ConstraintDecl,
    ) -> SchemaResult<Constraint> {
        let string_shaped = matches!(
            property_type,
            PropertyType::String | PropertyType::Enum { .. }
        );

        match decl {
            ConstraintDecl::MinLength(n) => {
                self.require_shape(path, property, string_shaped, "min_length", "string")?;
                Ok(Constraint::MinLength(n))
            }
            ConstraintDecl::MaxLength(n) => {
                self.require_shape(path, property, string_shaped, "max_length", "string")?;
                Ok(Constraint::MaxLength(n))
            }
            ConstraintDecl::Pattern(pattern) => {
                self.require_shape(path, property, string_shaped, "pattern", "string")?;
                let compiled = regex::Regex::new(&pattern).map_err(|e| {
                    SchemaError::parse_property(
                        path,
                        property,
                        format!("invalid pattern '{}': {}", pattern, e),
                    )
                })?;
                Ok(Constraint::Pattern(compiled))
            }
            ConstraintDecl::Range { min, max } => {
                self.require_shape(
                    path,
                    property,
                    matches!(property_type, PropertyType::Integer),
                    "range",
                    "integer",
                )?;
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo > hi {
                        return Err(SchemaError::parse_property(
                            path,
                            property,
                            format!("empty range [{}, {}]", lo, hi),
                        ));
                    }
                }
                Ok(Constraint::Range { min, max })
            }
            ConstraintDecl::OneOf(members) => {
                self.require_shape(path, property, string_shaped, "one_of", "string")?;
                if members.is_empty() {
                    return Err(SchemaError::parse_property(
                        path,
                        property,
                        "one_of membership list must not be empty",
                    ));
                }
                Ok(Constraint::OneOf(members))
            }
            ConstraintDecl::Predicate(name) => {
                let check = self.predicates.get(&name).cloned().ok_or_else(|| {
                    SchemaError::parse_property(
                        path,
                        property,
                        format!("unknown predicate '{}'", name),
                    )
                })?;
                Ok(Constraint::Predicate { name, check })
            }
        }
    }

    fn require_shape(
        &self,
        path: &Path,
        property: &str,
        compatible: bool,
        constraint: &str,
        wanted: &str,
    ) -> SchemaResult<()> {
        if compatible {
            Ok(())
        } else {
            Err(SchemaError::parse_property(
                path,
                property,
                format!("'{}' constraint requires a {} property", constraint, wanted),
            ))
        }
    }

    /// A declared default must coerce to the property type and pass the
    /// property's own constraint chain; a default the schema itself would
    /// reject is an authoring mistake caught at load time.
    fn compile_default(
        &self,
        path: &Path,
        rule: &PropertyRule,
        raw: &serde_json::Value,
    ) -> SchemaResult<Value> {
        let value = rule.property_type.coerce(raw).map_err(|mismatch| {
            SchemaError::parse_property(
                path,
                &rule.name,
                format!(
                    "default value does not coerce: expected {}, got {}",
                    mismatch.expected, mismatch.actual
                ),
            )
        })?;

        if let Some(violation) = first_violation(rule, &value) {
            return Err(SchemaError::parse_property(
                path,
                &rule.name,
                format!("default value fails its own constraints: {}", violation),
            ));
        }

        Ok(value)
    }
}

impl Default for SchemaLoader {
    fn default() -> Self {
        Self::new()
    }
}
