//! DTO factory with a process-wide schema cache.
//!
//! The factory owns the one canonical, immutable [`Schema`] per DTO name.
//! Every `create()` call hands out a brand-new [`Dto`] that shares the
//! cached schema behind an `Arc` but owns its value and error state, so
//! concurrent request handlers never observe each other's in-flight
//! mutations.
//!
//! Cache policy: first-lookup parses are serialized under the cache write
//! lock. At most one parse happens per name, and readers only ever see a
//! fully parsed schema; a partially built one is never published.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::debug;

use super::Dto;
use crate::dto::value::Value;
use crate::schema::errors::{SchemaError, SchemaResult};
use crate::schema::loader::SchemaLoader;
use crate::schema::types::Schema;

/// Resolves DTO names to cached schemas and hands out isolated instances.
///
/// Schema files live one per DTO name at `<schema_dir>/<Name>.json`.
pub struct DtoFactory {
    schema_dir: PathBuf,
    loader: SchemaLoader,
    cache: RwLock<HashMap<String, Arc<Schema>>>,
}

impl DtoFactory {
    /// Creates a factory reading schema files from `schema_dir`.
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self::with_loader(schema_dir, SchemaLoader::new())
    }

    /// Creates a factory with a pre-configured loader (registered
    /// predicates).
    pub fn with_loader(schema_dir: impl Into<PathBuf>, loader: SchemaLoader) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            loader,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a named predicate on the underlying loader.
    ///
    /// Only affects schemas parsed after the call; registration belongs in
    /// setup code before the factory is shared.
    pub fn register_predicate<F>(&mut self, name: impl Into<String>, check: F)
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.loader.register_predicate(name, check);
    }

    /// Returns a fresh, empty [`Dto`] for the named schema.
    ///
    /// The first request for a name loads and caches its schema; every
    /// request, cached or not, returns a new instance with empty values and
    /// errors.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownDto`] when the name maps to no schema file
    ///   (including names that are not plain identifiers, which are never
    ///   resolved against the filesystem).
    /// - [`SchemaError::Parse`] when the schema file is malformed.
    pub fn create(&self, name: &str) -> SchemaResult<Dto> {
        let schema = self.schema_for(name)?;
        Ok(Dto::new(schema))
    }

    fn schema_for(&self, name: &str) -> SchemaResult<Arc<Schema>> {
        if !is_valid_name(name) {
            return Err(SchemaError::unknown_dto(name));
        }

        {
            let cache = self.cache.read().expect("schema cache poisoned");
            if let Some(schema) = cache.get(name) {
                debug!(schema = name, "schema cache hit");
                return Ok(Arc::clone(schema));
            }
        }

        let mut cache = self.cache.write().expect("schema cache poisoned");
        // Another caller may have loaded it between the locks.
        if let Some(schema) = cache.get(name) {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(self.load(name)?);
        cache.insert(name.to_string(), Arc::clone(&schema));
        debug!(schema = name, "schema cached");
        Ok(schema)
    }

    fn load(&self, name: &str) -> SchemaResult<Schema> {
        let path = self.schema_dir.join(format!("{}.json", name));
        let schema = match self.loader.load(&path) {
            Ok(schema) => schema,
            Err(SchemaError::NotFound { .. }) => {
                return Err(SchemaError::unknown_dto(name));
            }
            Err(other) => return Err(other),
        };

        if schema.name() != name {
            return Err(SchemaError::parse(
                path,
                format!(
                    "schema declares name '{}' but the file maps DTO name '{}'",
                    schema.name(),
                    name
                ),
            ));
        }

        Ok(schema)
    }

    /// Drops every cached schema. Administrative operation for test
    /// isolation; not used in normal request handling.
    pub fn clear_cache(&self) {
        self.cache.write().expect("schema cache poisoned").clear();
    }

    /// Number of schemas currently cached.
    pub fn cached_schema_count(&self) -> usize {
        self.cache.read().expect("schema cache poisoned").len()
    }
}

/// Schema names resolve to file names, so only plain identifiers are
/// accepted; anything with path separators or dots never reaches the
/// filesystem.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
