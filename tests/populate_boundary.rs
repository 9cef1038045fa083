//! Population trust-boundary tests.
//!
//! - Input keys the schema does not declare can never reach the value bag
//! - Explicit field subsets restrict population further
//! - Validation failures accumulate on the DTO, never raise from populate
//! - Strict mode names every undeclared key

use std::collections::BTreeMap;
use std::fs;

use serde_json::json;
use tempfile::TempDir;
use valise::{DtoFactory, PopulateError, RequestPopulator};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_factory() -> (TempDir, DtoFactory) {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("UpdateProfile.json"),
        r#"{
            "name": "UpdateProfile",
            "properties": [
                { "name": "display_name", "type": "string", "required": true,
                  "constraints": [ { "min_length": 1 }, { "max_length": 64 } ] },
                { "name": "bio", "type": "string",
                  "constraints": [ { "max_length": 500 } ] },
                { "name": "notifications", "type": "boolean", "default": true }
            ]
        }"#,
    )
    .unwrap();

    let factory = DtoFactory::new(dir.path());
    (dir, factory)
}

fn form(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// =============================================================================
// Mass-Assignment Safety Tests
// =============================================================================

/// Undeclared keys never enter the value bag, whatever the input carries.
#[test]
fn test_undeclared_keys_never_populate() {
    let (_dir, factory) = setup_factory();
    let mut dto = factory.create("UpdateProfile").unwrap();

    let input = form(&[
        ("display_name", json!("Alice")),
        ("is_admin", json!(true)),
        ("role", json!("superuser")),
        ("user_id", json!(1)),
    ]);

    RequestPopulator::new().populate(&mut dto, &input).unwrap();

    assert_eq!(dto.get("display_name").unwrap().as_str(), Some("Alice"));
    assert_eq!(dto.get("is_admin"), None);
    assert_eq!(dto.get("role"), None);
    assert_eq!(dto.get("user_id"), None);
    assert!(dto.errors().is_empty());
}

/// Hostile input containing only undeclared keys leaves the DTO empty.
#[test]
fn test_fully_hostile_input_is_inert() {
    let (_dir, factory) = setup_factory();
    let mut dto = factory.create("UpdateProfile").unwrap();

    let input = form(&[("is_admin", json!(true)), ("balance", json!(9999))]);
    RequestPopulator::new().populate(&mut dto, &input).unwrap();

    assert!(!dto.is_populated());
}

// =============================================================================
// Field Subset Tests
// =============================================================================

/// An explicit allowlist populates only the named fields.
#[test]
fn test_explicit_fields_subset() {
    let (_dir, factory) = setup_factory();
    let mut dto = factory.create("UpdateProfile").unwrap();

    let input = form(&[
        ("display_name", json!("Alice")),
        ("bio", json!("Hi there")),
        ("notifications", json!("false")),
    ]);

    RequestPopulator::new()
        .populate_fields(&mut dto, &input, &["display_name"])
        .unwrap();

    assert_eq!(dto.get("display_name").unwrap().as_str(), Some("Alice"));
    assert_eq!(dto.get("bio"), None);
    assert_eq!(dto.get("notifications"), None);
}

/// Form-encoded booleans coerce on the way in.
#[test]
fn test_form_boolean_coercion() {
    let (_dir, factory) = setup_factory();
    let mut dto = factory.create("UpdateProfile").unwrap();

    let input = form(&[
        ("display_name", json!("Alice")),
        ("notifications", json!("false")),
    ]);
    RequestPopulator::new().populate(&mut dto, &input).unwrap();

    assert_eq!(dto.get("notifications").unwrap().as_bool(), Some(false));
}

// =============================================================================
// Error Accumulation Tests
// =============================================================================

/// populate never raises for bad values; every problem is collected so one
/// pass surfaces all of them.
#[test]
fn test_populate_collects_every_failure() {
    let (_dir, factory) = setup_factory();
    let mut dto = factory.create("UpdateProfile").unwrap();

    let long_bio = "x".repeat(501);
    let input = form(&[
        ("display_name", json!("")),
        ("bio", json!(long_bio)),
        ("notifications", json!("maybe")),
    ]);

    let outcome = RequestPopulator::new().populate(&mut dto, &input);

    assert!(outcome.is_ok());
    assert_eq!(dto.errors().len(), 3);
}

/// The subsequent validate() pass is the single aggregate decision point.
#[test]
fn test_populate_then_validate_flow() {
    let (_dir, factory) = setup_factory();
    let mut dto = factory.create("UpdateProfile").unwrap();

    let input = form(&[("bio", json!("Hi")), ("spurious", json!(1))]);
    RequestPopulator::new().populate(&mut dto, &input).unwrap();

    let result = dto.validate();
    assert!(!result.is_valid());
    assert_eq!(result.violations().len(), 1);
    assert_eq!(result.violations()[0].property, "display_name");
    // Default landed during the pass.
    assert_eq!(dto.get("notifications").unwrap().as_bool(), Some(true));
}

// =============================================================================
// Strict Mode Tests
// =============================================================================

/// Strict mode reports every undeclared key after the full pass.
#[test]
fn test_strict_mode_names_all_offenders() {
    let (_dir, factory) = setup_factory();
    let mut dto = factory.create("UpdateProfile").unwrap();

    let input = form(&[
        ("bio", json!("Hi")),
        ("is_admin", json!(true)),
        ("role", json!("admin")),
    ]);

    let err = RequestPopulator::strict()
        .populate(&mut dto, &input)
        .unwrap_err();

    let PopulateError::UnknownFields(fields) = err;
    assert_eq!(fields, vec!["is_admin".to_string(), "role".to_string()]);
}

/// Strict mode still accumulates value failures rather than raising them.
#[test]
fn test_strict_mode_keeps_value_failures_recoverable() {
    let (_dir, factory) = setup_factory();
    let mut dto = factory.create("UpdateProfile").unwrap();

    let input = form(&[("display_name", json!(""))]);
    let outcome = RequestPopulator::strict().populate(&mut dto, &input);

    assert!(outcome.is_ok());
    assert_eq!(dto.errors().len(), 1);
}
