//! Request-driven DTO population.
//!
//! Copies values from an external key/value input (decoded form or body
//! data) into a [`Dto`], restricted to the schema's declared properties.
//! Undeclared input keys are skipped by default: arbitrary external input
//! can never set properties the schema does not declare, which closes the
//! mass-assignment surface. Validation failures are never raised from here;
//! they accumulate on the DTO for the caller's `validate()` pass.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::dto::Dto;

/// Mapping-like key/value input produced by an external request-handling
/// collaborator. This subsystem never parses a wire format itself.
pub trait PopulationSource {
    /// Input keys, in source order where the source has one.
    fn keys(&self) -> Vec<&str>;

    /// Value for a key, if present.
    fn get_value(&self, key: &str) -> Option<&serde_json::Value>;
}

impl PopulationSource for serde_json::Map<String, serde_json::Value> {
    fn keys(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn get_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.get(key)
    }
}

impl PopulationSource for HashMap<String, serde_json::Value> {
    fn keys(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn get_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.get(key)
    }
}

impl PopulationSource for BTreeMap<String, serde_json::Value> {
    fn keys(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn get_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.get(key)
    }
}

/// What to do with input keys the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFieldPolicy {
    /// Silently skip undeclared keys. The default, and the trust-boundary
    /// behavior callers populating from raw request input rely on.
    #[default]
    Skip,
    /// Fail the populate call, naming every undeclared key. Opt-in strict
    /// mode for callers that control their input and want mistyped field
    /// names surfaced instead of swallowed.
    Reject,
}

/// Populate failure. Only produced under [`UnknownFieldPolicy::Reject`];
/// data-level validation failures never surface here.
#[derive(Debug, Clone, Error)]
pub enum PopulateError {
    /// Input carried keys the schema does not declare (strict mode only).
    #[error("input contains undeclared properties: {}", .0.join(", "))]
    UnknownFields(Vec<String>),
}

/// Copies input values into a DTO through the schema's declared-property
/// allowlist.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestPopulator {
    policy: UnknownFieldPolicy,
}

impl RequestPopulator {
    /// Populator with the default skip policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Populator that rejects undeclared input keys.
    pub fn strict() -> Self {
        Self {
            policy: UnknownFieldPolicy::Reject,
        }
    }

    /// Populates `dto` from every key present in `input`.
    ///
    /// Each declared key is fed through [`Dto::set`]; constraint failures
    /// accumulate on the DTO and are not reported here. Under the default
    /// policy this always returns `Ok`.
    pub fn populate<S: PopulationSource>(
        &self,
        dto: &mut Dto,
        input: &S,
    ) -> Result<(), PopulateError> {
        let keys = input.keys();
        self.apply(dto, input, &keys)
    }

    /// Populates `dto` from only the named fields, even when the input
    /// carries extra, unrelated keys. Fields absent from the input are
    /// skipped.
    pub fn populate_fields<S: PopulationSource>(
        &self,
        dto: &mut Dto,
        input: &S,
        fields: &[&str],
    ) -> Result<(), PopulateError> {
        self.apply(dto, input, fields)
    }

    fn apply<S: PopulationSource>(
        &self,
        dto: &mut Dto,
        input: &S,
        fields: &[&str],
    ) -> Result<(), PopulateError> {
        let mut unknown = Vec::new();

        for &field in fields {
            let Some(raw) = input.get_value(field) else {
                continue;
            };
            if dto.schema().declares(field) {
                dto.set(field, raw.clone());
            } else {
                unknown.push(field.to_string());
            }
        }

        match self.policy {
            UnknownFieldPolicy::Skip => Ok(()),
            UnknownFieldPolicy::Reject if unknown.is_empty() => Ok(()),
            UnknownFieldPolicy::Reject => Err(PopulateError::UnknownFields(unknown)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Constraint, PropertyRule, PropertyType, Schema};
    use serde_json::json;
    use std::sync::Arc;

    fn post_dto() -> Dto {
        Dto::new(Arc::new(Schema::new(
            "CreatePost",
            vec![
                PropertyRule::required("title", PropertyType::String)
                    .with_constraint(Constraint::MinLength(1)),
                PropertyRule::required("slug", PropertyType::String).with_constraint(
                    Constraint::Pattern(regex::Regex::new("^[a-z0-9-]+$").unwrap()),
                ),
            ],
        )))
    }

    fn input(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_populate_copies_declared_keys() {
        let mut dto = post_dto();
        let input = input(&[("title", json!("Hello")), ("slug", json!("hello"))]);

        RequestPopulator::new().populate(&mut dto, &input).unwrap();

        assert_eq!(dto.get("title").unwrap().as_str(), Some("Hello"));
        assert_eq!(dto.get("slug").unwrap().as_str(), Some("hello"));
    }

    #[test]
    fn test_populate_skips_undeclared_keys() {
        let mut dto = post_dto();
        let input = input(&[
            ("title", json!("Hello")),
            ("is_admin", json!(true)),
            ("slug", json!("hello")),
        ]);

        RequestPopulator::new().populate(&mut dto, &input).unwrap();

        assert_eq!(dto.get("is_admin"), None);
        assert!(dto.errors().is_empty());
    }

    #[test]
    fn test_populate_fields_restricts_to_subset() {
        let mut dto = post_dto();
        let input = input(&[("title", json!("Hello")), ("slug", json!("hello"))]);

        RequestPopulator::new()
            .populate_fields(&mut dto, &input, &["title"])
            .unwrap();

        assert_eq!(dto.get("title").unwrap().as_str(), Some("Hello"));
        assert_eq!(dto.get("slug"), None);
    }

    #[test]
    fn test_populate_fields_skips_fields_absent_from_input() {
        let mut dto = post_dto();
        let input = input(&[("title", json!("Hello"))]);

        RequestPopulator::new()
            .populate_fields(&mut dto, &input, &["title", "slug"])
            .unwrap();

        assert_eq!(dto.get("slug"), None);
        assert!(dto.errors().is_empty());
    }

    #[test]
    fn test_validation_failures_accumulate_not_raise() {
        let mut dto = post_dto();
        let input = input(&[("title", json!("")), ("slug", json!("Bad Slug!"))]);

        let outcome = RequestPopulator::new().populate(&mut dto, &input);

        assert!(outcome.is_ok());
        assert_eq!(dto.errors().len(), 2);
    }

    #[test]
    fn test_strict_mode_rejects_unknown_keys() {
        let mut dto = post_dto();
        let input = input(&[
            ("title", json!("Hello")),
            ("is_admin", json!(true)),
            ("role", json!("admin")),
        ]);

        let err = RequestPopulator::strict()
            .populate(&mut dto, &input)
            .unwrap_err();

        match err {
            PopulateError::UnknownFields(fields) => {
                assert_eq!(fields, vec!["is_admin".to_string(), "role".to_string()]);
            }
        }
        // Declared keys were still copied before the rejection.
        assert_eq!(dto.get("title").unwrap().as_str(), Some("Hello"));
    }

    #[test]
    fn test_strict_mode_accepts_clean_input() {
        let mut dto = post_dto();
        let input = input(&[("title", json!("Hello")), ("slug", json!("hello"))]);
        assert!(RequestPopulator::strict().populate(&mut dto, &input).is_ok());
    }
}
