//! Schema-bound DTO value bags.
//!
//! A [`Dto`] holds a read-only reference to its parsed [`Schema`] and owns
//! its own value and error state. Setting a value runs the property's checks
//! immediately but never fails hard: problems accumulate so that one
//! population pass can surface every bad field at once. `validate()` is the
//! single aggregate decision point.

pub mod factory;
pub mod validation;
pub mod value;

use std::collections::HashMap;
use std::sync::Arc;

use crate::schema::types::Schema;

pub use factory::DtoFactory;
pub use validation::{ConstraintViolation, ValidationFailed, ValidationResult};
pub use value::Value;

/// A named, schema-bound value bag with per-property validation state.
///
/// Cloning yields an instance that shares the immutable schema but owns
/// independent copies of `values` and `errors`; two DTOs derived from the
/// same schema never observe each other's mutations.
#[derive(Debug, Clone)]
pub struct Dto {
    schema: Arc<Schema>,
    values: HashMap<String, Value>,
    errors: Vec<ConstraintViolation>,
}

impl Dto {
    /// Creates an empty DTO bound to the given schema.
    ///
    /// Normal request handling obtains DTOs from [`DtoFactory::create`];
    /// direct construction exists for programmatic schemas and tests.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            values: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// The schema this DTO is bound to.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the current value of a property, if set.
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.values.get(property)
    }

    /// Sets a property from raw input.
    ///
    /// An undeclared property name is a no-op: this is the mass-assignment
    /// contract relied on by the populator, which feeds arbitrary external
    /// keys through here. For declared properties the raw value is coerced
    /// and the constraint chain runs immediately; on failure a violation is
    /// appended to [`errors`](Self::errors) and the property keeps its prior
    /// value (or stays unset). Never returns an error.
    pub fn set(&mut self, property: &str, raw: serde_json::Value) {
        let Some(rule) = self.schema.rule(property) else {
            return;
        };

        match rule.property_type.coerce(&raw) {
            Ok(value) => match validation::first_violation(rule, &value) {
                Some(violation) => self.errors.push(violation),
                None => {
                    self.values.insert(rule.name.clone(), value);
                }
            },
            Err(mismatch) => {
                self.errors
                    .push(ConstraintViolation::type_mismatch(property, mismatch));
            }
        }
    }

    /// Recomputes validation state across the whole schema.
    ///
    /// The pass starts from scratch (stale errors are discarded, not
    /// appended to), applies declared defaults to absent optional
    /// properties, then walks properties in schema-declaration order:
    /// required-presence first, then the constraint chain on the current
    /// value. Only a single property's own chain short-circuits; every
    /// property is evaluated even when an earlier one failed. Calling this
    /// twice with no intervening mutation yields identical results.
    pub fn validate(&mut self) -> ValidationResult {
        for rule in self.schema.rules() {
            if rule.required || self.values.contains_key(&rule.name) {
                continue;
            }
            if let Some(default) = &rule.default {
                self.values.insert(rule.name.clone(), default.clone());
            }
        }

        let mut violations = Vec::new();
        for rule in self.schema.rules() {
            match self.values.get(&rule.name) {
                Some(value) => {
                    if let Some(violation) = validation::first_violation(rule, value) {
                        violations.push(violation);
                    }
                }
                None => {
                    if rule.required {
                        violations.push(ConstraintViolation::required(&rule.name));
                    }
                }
            }
        }

        self.errors = violations.clone();
        ValidationResult::new(violations)
    }

    /// Violations as of the most recent `set()` or `validate()` call.
    pub fn errors(&self) -> &[ConstraintViolation] {
        &self.errors
    }

    /// True when any property has been set.
    pub fn is_populated(&self) -> bool {
        !self.values.is_empty()
    }

    /// Set properties and their values, in schema-declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .rules()
            .iter()
            .filter_map(|rule| self.values.get(&rule.name).map(|v| (rule.name.as_str(), v)))
    }
}
