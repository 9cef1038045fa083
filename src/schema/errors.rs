//! Schema error types.
//!
//! All three variants are structural failures: a caller never receives a
//! partially built schema. Data-level validation failures are not errors at
//! this layer; they accumulate on the [`Dto`](crate::dto::Dto) instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Structural schema failures surfaced to the factory caller.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// Schema file missing at an explicitly given path.
    #[error("schema file not found: {path}")]
    NotFound {
        /// Path that was probed
        path: PathBuf,
    },

    /// Malformed schema declaration. Names the file and, where the failure
    /// is attributable to one property, that property.
    #[error("malformed schema file '{}'{}: {reason}", .file.display(), property_suffix(.property))]
    Parse {
        /// File the declaration came from
        file: PathBuf,
        /// Offending property, when known
        property: Option<String>,
        /// What went wrong
        reason: String,
    },

    /// DTO name cannot be mapped to any schema file.
    #[error("unknown DTO '{name}': no schema file for this name")]
    UnknownDto {
        /// Requested DTO name
        name: String,
    },
}

impl SchemaError {
    /// Parse failure not tied to a single property.
    pub fn parse(file: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            property: None,
            reason: reason.into(),
        }
    }

    /// Parse failure attributable to one declared property.
    pub fn parse_property(
        file: impl Into<PathBuf>,
        property: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Parse {
            file: file.into(),
            property: Some(property.into()),
            reason: reason.into(),
        }
    }

    /// Missing schema file error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Unmappable DTO name error.
    pub fn unknown_dto(name: impl Into<String>) -> Self {
        Self::UnknownDto { name: name.into() }
    }
}

fn property_suffix(property: &Option<String>) -> String {
    match property {
        Some(name) => format!(", property '{}'", name),
        None => String::new(),
    }
}
