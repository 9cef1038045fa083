//! valise - schema-driven DTO construction, population and validation
//!
//! Declarative schemas loaded from disk describe the shape of each DTO; the
//! factory caches parsed schemas and hands out isolated value bags; the
//! populator copies request input through a declared-property allowlist;
//! validation accumulates every failure into one ordered, deterministic
//! result.

pub mod dto;
pub mod populate;
pub mod schema;

pub use dto::{ConstraintViolation, Dto, DtoFactory, ValidationFailed, ValidationResult, Value};
pub use populate::{PopulateError, PopulationSource, RequestPopulator, UnknownFieldPolicy};
pub use schema::{PropertyRule, PropertyType, Schema, SchemaError, SchemaLoader, SchemaResult};
