//! Typed CRUD facade over the key-value adapter.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::core::adapter::KeyValueAdapter;
use crate::core::mapping::{Entity, PersistentEntity, TypeRef};
use crate::core::types::Keyspace;
use crate::core::validation::validate_keyspace;
use crate::error::{MappingError, Result};

/// CRUD operations for one entity type stored in one keyspace.
pub struct Repository<T: PersistentEntity> {
    adapter: Arc<KeyValueAdapter>,
    keyspace: Keyspace,
    _entity: PhantomData<fn() -> T>,
}

impl<T: PersistentEntity> Repository<T> {
    /// Repository using the entity's descriptor keyspace (`Person` -> `person`).
    pub fn new(adapter: Arc<KeyValueAdapter>) -> Self {
        let keyspace = T::descriptor().keyspace().to_string();
        Self {
            adapter,
            keyspace,
            _entity: PhantomData,
        }
    }

    /// Repository storing entities under an explicit keyspace.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the keyspace is invalid.
    pub fn with_keyspace(adapter: Arc<KeyValueAdapter>, keyspace: impl Into<String>) -> Result<Self> {
        let keyspace = keyspace.into();
        validate_keyspace(&keyspace)?;
        Ok(Self {
            adapter,
            keyspace,
            _entity: PhantomData,
        })
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// Store `entity` under its own identifier.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::MissingId` if the entity has no identifier
    /// value, or any error from [`KeyValueAdapter::put`].
    pub fn save(&self, entity: &T) -> Result<()> {
        let dyn_entity: &dyn Entity = entity;
        let id = dyn_entity
            .id()
            .ok_or_else(|| MappingError::MissingId(TypeRef::of::<T>().name().to_string()))?;
        self.adapter.put(&id, entity, &self.keyspace)?;
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        self.adapter.get_as::<T>(id, &self.keyspace)
    }

    pub fn find_all(&self) -> Result<Vec<T>> {
        self.adapter.get_all_of_as::<T>(&self.keyspace)
    }

    pub fn exists_by_id(&self, id: &str) -> Result<bool> {
        self.adapter.contains(id, &self.keyspace)
    }

    pub fn count(&self) -> Result<usize> {
        self.adapter.count(&self.keyspace)
    }

    /// Delete the entity stored under `id`, returning it if it existed.
    pub fn delete_by_id(&self, id: &str) -> Result<Option<T>> {
        self.adapter.delete_as::<T>(id, &self.keyspace)
    }

    pub fn delete_all(&self) -> Result<()> {
        self.adapter.delete_all_of(&self.keyspace)
    }
}

impl<T: PersistentEntity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            keyspace: self.keyspace.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: PersistentEntity> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &TypeRef::of::<T>().name())
            .field("keyspace", &self.keyspace)
            .finish()
    }
}
