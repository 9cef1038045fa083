//! Declarative schema definitions and loading.
//!
//! One JSON file per DTO name declares an ordered list of properties with
//! type, required flag, constraints and optional default. Parsed schemas
//! are immutable; the factory shares them behind an `Arc`.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{SchemaError, SchemaResult};
pub use loader::SchemaLoader;
pub use types::{Constraint, PredicateFn, PropertyRule, PropertyType, Schema, TypeMismatch};
