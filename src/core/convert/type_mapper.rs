//! Type hints stored inside secret documents.
//!
//! A [`TypeMapper`] records the runtime type of an entity under a reserved
//! field of the document body and recovers it on read. The string written
//! there is an alias produced by a priority-ordered chain of
//! [`TypeAliasResolver`]s: the first resolver with an answer wins, in both
//! directions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::core::constants::DEFAULT_TYPE_KEY;
use crate::core::mapping::{MappingContext, PersistentEntity, TypeRef};
use crate::core::types::{Alias, Body};
use crate::error::{ConfigError, Result};

/// One link of the alias chain.
pub trait TypeAliasResolver: Send + Sync + fmt::Debug {
    /// Alias to store for `type_ref`, `None` if this resolver has no opinion.
    fn alias_for(&self, type_ref: TypeRef) -> Option<Alias>;

    /// Type named by `alias`, `None` if this resolver does not know it.
    fn resolve(&self, alias: &str) -> Option<TypeRef>;
}

/// Explicit, bijective table of short aliases.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<TypeRef, Alias>,
    types: HashMap<Alias, TypeRef>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alias for `T`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the alias is empty or already
    /// maps to another type, or if `T` already has an alias.
    pub fn with_alias<T: PersistentEntity>(self, alias: impl Into<String>) -> Result<Self> {
        self.with_type_alias(TypeRef::of::<T>(), alias)
    }

    /// Add an alias for an arbitrary type reference.
    pub fn with_type_alias(mut self, type_ref: TypeRef, alias: impl Into<String>) -> Result<Self> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "aliases",
                reason: format!("empty alias for {}", type_ref),
            }
            .into());
        }
        if let Some(existing) = self.types.get(&alias) {
            return Err(ConfigError::InvalidValue {
                field: "aliases",
                reason: format!("alias '{}' already maps to {}", alias, existing),
            }
            .into());
        }
        if let Some(existing) = self.aliases.get(&type_ref) {
            return Err(ConfigError::InvalidValue {
                field: "aliases",
                reason: format!("{} already has alias '{}'", type_ref, existing),
            }
            .into());
        }

        self.types.insert(alias.clone(), type_ref);
        self.aliases.insert(type_ref, alias);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl TypeAliasResolver for AliasTable {
    fn alias_for(&self, type_ref: TypeRef) -> Option<Alias> {
        self.aliases.get(&type_ref).cloned()
    }

    fn resolve(&self, alias: &str) -> Option<TypeRef> {
        self.types.get(alias).copied()
    }
}

/// Fallback resolver using the fully-qualified type name as alias.
///
/// Any type gets an alias; only names registered in the mapping context
/// resolve back to a type.
#[derive(Debug, Clone)]
pub struct QualifiedNameResolver {
    context: Arc<MappingContext>,
}

impl QualifiedNameResolver {
    pub fn new(context: Arc<MappingContext>) -> Self {
        Self { context }
    }
}

impl TypeAliasResolver for QualifiedNameResolver {
    fn alias_for(&self, type_ref: TypeRef) -> Option<Alias> {
        Some(type_ref.name().to_string())
    }

    fn resolve(&self, alias: &str) -> Option<TypeRef> {
        self.context.type_for_name(alias)
    }
}

/// Reads and writes type hints on document bodies.
pub trait TypeMapper: Send + Sync + fmt::Debug {
    /// Record `type_ref` in `sink`. Does nothing if no alias is available.
    fn write_type(&self, type_ref: TypeRef, sink: &mut Body);

    /// Type recorded in `source`, `None` if absent or unresolvable.
    fn read_type(&self, source: &Body) -> Option<TypeRef>;

    /// Whether `key` is the reserved type hint field.
    fn is_type_key(&self, key: &str) -> bool;
}

/// Type mapper backed by an ordered resolver chain.
#[derive(Debug)]
pub struct DefaultTypeMapper {
    type_key: Option<String>,
    resolvers: Vec<Box<dyn TypeAliasResolver>>,
}

impl DefaultTypeMapper {
    /// Mapper writing qualified type names under `type_key`.
    ///
    /// A `None` key disables type hints entirely.
    pub fn new(type_key: Option<&str>, context: Arc<MappingContext>) -> Self {
        Self::with_resolvers(
            type_key,
            vec![Box::new(QualifiedNameResolver::new(context))],
        )
    }

    /// Mapper using [`DEFAULT_TYPE_KEY`] and qualified type names.
    pub fn with_default_key(context: Arc<MappingContext>) -> Self {
        Self::new(Some(DEFAULT_TYPE_KEY), context)
    }

    /// Mapper with an explicit resolver chain, consulted in order.
    pub fn with_resolvers(
        type_key: Option<&str>,
        resolvers: Vec<Box<dyn TypeAliasResolver>>,
    ) -> Self {
        Self {
            type_key: type_key.map(str::to_string),
            resolvers,
        }
    }

    pub fn type_key(&self) -> Option<&str> {
        self.type_key.as_deref()
    }

    fn alias_for(&self, type_ref: TypeRef) -> Option<Alias> {
        self.resolvers.iter().find_map(|r| r.alias_for(type_ref))
    }

    fn resolve(&self, alias: &str) -> Option<TypeRef> {
        self.resolvers.iter().find_map(|r| r.resolve(alias))
    }
}

impl TypeMapper for DefaultTypeMapper {
    fn write_type(&self, type_ref: TypeRef, sink: &mut Body) {
        let Some(key) = &self.type_key else {
            return;
        };

        if let Some(alias) = self.alias_for(type_ref) {
            trace!(key = %key, alias = %alias, "writing type hint");
            sink.insert(key.clone(), Value::String(alias));
        }
    }

    fn read_type(&self, source: &Body) -> Option<TypeRef> {
        let key = self.type_key.as_deref()?;

        let alias = match source.get(key) {
            Some(Value::String(alias)) if !alias.is_empty() => alias,
            _ => return None,
        };

        let resolved = self.resolve(alias);
        if resolved.is_none() {
            debug!(alias = %alias, "type hint does not resolve to a known type");
        }
        resolved
    }

    fn is_type_key(&self, key: &str) -> bool {
        self.type_key.as_deref() == Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent_entity;
    use serde_json::json;

    #[derive(Debug, Clone, Default)]
    struct Sample {
        value: String,
    }

    persistent_entity!(Sample { value: String });

    #[derive(Debug, Clone, Default)]
    struct Other {
        value: String,
    }

    persistent_entity!(Other { value: String });

    fn context() -> Arc<MappingContext> {
        Arc::new(MappingContext::new().with_entity::<Sample>())
    }

    #[test]
    fn test_first_resolver_wins() {
        let table = AliasTable::new().with_alias::<Sample>("s").unwrap();
        let mapper = DefaultTypeMapper::with_resolvers(
            Some("_class"),
            vec![
                Box::new(table),
                Box::new(QualifiedNameResolver::new(context())),
            ],
        );

        let mut body = Body::new();
        mapper.write_type(TypeRef::of::<Sample>(), &mut body);
        assert_eq!(body.get("_class"), Some(&json!("s")));

        let mut body = Body::new();
        mapper.write_type(TypeRef::of::<Other>(), &mut body);
        assert_eq!(
            body.get("_class"),
            Some(&json!(TypeRef::of::<Other>().name()))
        );
    }

    #[test]
    fn test_non_string_hint_reads_no_type() {
        let mapper = DefaultTypeMapper::with_default_key(context());
        let mut body = Body::new();
        body.insert("_class".to_string(), json!(42));
        assert_eq!(mapper.read_type(&body), None);
    }

    #[test]
    fn test_alias_table_rejects_duplicates() {
        let table = AliasTable::new().with_alias::<Sample>("x").unwrap();
        assert!(table.clone().with_alias::<Other>("x").is_err());
        assert!(table.with_alias::<Sample>("y").is_err());
        assert!(AliasTable::new().with_alias::<Sample>("").is_err());
    }

    #[test]
    fn test_type_key_accessor() {
        let mapper = DefaultTypeMapper::new(None, context());
        assert_eq!(mapper.type_key(), None);
        assert!(!mapper.is_type_key("_class"));
    }
}
