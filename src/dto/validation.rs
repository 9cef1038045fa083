//! Constraint checking and aggregate validation results.
//!
//! Data-level failures are never raised as control flow. A failed check
//! produces a [`ConstraintViolation`]; `Dto::set` collects at most one per
//! call and `Dto::validate` aggregates them across the whole schema in
//! declaration order. Hard errors are reserved for schema-structural
//! problems (see [`crate::schema::SchemaError`]).

use std::fmt;

use thiserror::Error;

use crate::dto::value::Value;
use crate::schema::types::{Constraint, PropertyRule, TypeMismatch};

/// One failed check against one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    /// Property the check ran against
    pub property: String,
    /// What the schema expected
    pub expected: String,
    /// What the input carried
    pub actual: String,
}

impl ConstraintViolation {
    /// Required property missing at validation time.
    pub fn required(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            expected: "a value (required)".into(),
            actual: "missing".into(),
        }
    }

    /// Raw input failed coercion to the declared type.
    pub fn type_mismatch(property: impl Into<String>, mismatch: TypeMismatch) -> Self {
        Self {
            property: property.into(),
            expected: mismatch.expected,
            actual: mismatch.actual,
        }
    }

    /// String shorter than the declared minimum.
    pub fn too_short(property: impl Into<String>, min: usize, value: &str) -> Self {
        Self {
            property: property.into(),
            expected: format!("at least {} characters", min),
            actual: format!("'{}' ({} characters)", value, value.chars().count()),
        }
    }

    /// String longer than the declared maximum.
    pub fn too_long(property: impl Into<String>, max: usize, value: &str) -> Self {
        Self {
            property: property.into(),
            expected: format!("at most {} characters", max),
            actual: format!("{} characters", value.chars().count()),
        }
    }

    /// String did not match the declared pattern.
    pub fn no_pattern_match(property: impl Into<String>, pattern: &str, value: &str) -> Self {
        Self {
            property: property.into(),
            expected: format!("match for pattern '{}'", pattern),
            actual: format!("'{}'", value),
        }
    }

    /// Integer outside the declared inclusive bounds.
    pub fn out_of_range(
        property: impl Into<String>,
        min: Option<i64>,
        max: Option<i64>,
        value: i64,
    ) -> Self {
        let expected = match (min, max) {
            (Some(lo), Some(hi)) => format!("value in [{}, {}]", lo, hi),
            (Some(lo), None) => format!("value >= {}", lo),
            (None, Some(hi)) => format!("value <= {}", hi),
            (None, None) => "any value".into(),
        };
        Self {
            property: property.into(),
            expected,
            actual: value.to_string(),
        }
    }

    /// String not in the declared membership list.
    pub fn not_a_member(property: impl Into<String>, members: &[String], value: &str) -> Self {
        Self {
            property: property.into(),
            expected: format!("one of [{}]", members.join(", ")),
            actual: format!("'{}'", value),
        }
    }

    /// Named predicate rejected the value.
    pub fn predicate_failed(
        property: impl Into<String>,
        predicate: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            property: property.into(),
            expected: format!("predicate '{}' to pass", predicate),
            actual: reason.into(),
        }
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "property '{}': expected {}, got {}",
            self.property, self.expected, self.actual
        )
    }
}

/// Outcome of a full `validate()` pass.
///
/// Violations are ordered by schema declaration, never by `set()` arrival
/// order, so repeated validation of identical input reports identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    violations: Vec<ConstraintViolation>,
}

impl ValidationResult {
    pub(crate) fn new(violations: Vec<ConstraintViolation>) -> Self {
        Self { violations }
    }

    /// True iff the pass produced no violations.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations in schema-declaration order.
    pub fn violations(&self) -> &[ConstraintViolation] {
        &self.violations
    }

    /// Human-readable messages, one per violation, in order.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }

    /// Converts the aggregate into a `Result` for `?`-style callers.
    pub fn ok_or_failed(self) -> Result<(), ValidationFailed> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ValidationFailed {
                violations: self.violations,
            })
        }
    }
}

/// Aggregate validation failure carrying every violation of the pass.
#[derive(Debug, Clone, Error)]
pub struct ValidationFailed {
    /// Violations in schema-declaration order
    pub violations: Vec<ConstraintViolation>,
}

impl fmt::Display for ValidationFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "validation failed: {}", joined)
    }
}

/// Runs a rule's constraint chain against a coerced value.
///
/// Short-circuits at the first failing constraint of this one property;
/// callers evaluating many properties keep going regardless of the outcome
/// here. Length, pattern and membership checks apply to string-shaped
/// values and range checks to integers; the loader rejects incompatible
/// declarations at parse time, so a shape mismatch here only happens with a
/// hand-built schema and reports as a violation rather than a panic.
pub(crate) fn first_violation(rule: &PropertyRule, value: &Value) -> Option<ConstraintViolation> {
    for constraint in &rule.constraints {
        let violation = match constraint {
            Constraint::MinLength(min) => match value.as_str() {
                Some(s) if s.chars().count() < *min => {
                    Some(ConstraintViolation::too_short(&rule.name, *min, s))
                }
                Some(_) => None,
                None => Some(shape_mismatch(rule, "string", value)),
            },
            Constraint::MaxLength(max) => match value.as_str() {
                Some(s) if s.chars().count() > *max => {
                    Some(ConstraintViolation::too_long(&rule.name, *max, s))
                }
                Some(_) => None,
                None => Some(shape_mismatch(rule, "string", value)),
            },
            Constraint::Pattern(re) => match value.as_str() {
                Some(s) if !re.is_match(s) => {
                    Some(ConstraintViolation::no_pattern_match(&rule.name, re.as_str(), s))
                }
                Some(_) => None,
                None => Some(shape_mismatch(rule, "string", value)),
            },
            Constraint::Range { min, max } => match value.as_i64() {
                Some(n) if min.is_some_and(|lo| n < lo) || max.is_some_and(|hi| n > hi) => {
                    Some(ConstraintViolation::out_of_range(&rule.name, *min, *max, n))
                }
                Some(_) => None,
                None => Some(shape_mismatch(rule, "integer", value)),
            },
            Constraint::OneOf(members) => match value.as_str() {
                Some(s) if !members.iter().any(|m| m == s) => {
                    Some(ConstraintViolation::not_a_member(&rule.name, members, s))
                }
                Some(_) => None,
                None => Some(shape_mismatch(rule, "string", value)),
            },
            Constraint::Predicate { name, check } => check(value)
                .err()
                .map(|reason| ConstraintViolation::predicate_failed(&rule.name, name, reason)),
        };
        if violation.is_some() {
            return violation;
        }
    }
    None
}

fn shape_mismatch(rule: &PropertyRule, expected: &str, value: &Value) -> ConstraintViolation {
    ConstraintViolation {
        property: rule.name.clone(),
        expected: format!("{} value for constraint check", expected),
        actual: value.type_name().to_string(),
    }
}
