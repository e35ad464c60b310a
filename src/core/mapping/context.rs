//! Registry of entity descriptors.
//!
//! The mapping context answers "which entity type has this qualified name"
//! and "how is this type described". It is built once at startup and then
//! shared read-only, typically behind an `Arc`.

use std::collections::HashMap;

use tracing::debug;

use super::{EntityDescriptor, PersistentEntity, TypeRef};

/// Entity descriptors keyed by type and by qualified type name.
#[derive(Debug, Default)]
pub struct MappingContext {
    entities: HashMap<TypeRef, EntityDescriptor>,
    by_name: HashMap<&'static str, TypeRef>,
}

impl MappingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`, replacing any previous descriptor for the same type.
    pub fn register<T: PersistentEntity>(&mut self) -> &mut Self {
        self.register_descriptor(T::descriptor())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_entity<T: PersistentEntity>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// Register a hand-written descriptor.
    pub fn register_descriptor(&mut self, descriptor: EntityDescriptor) -> &mut Self {
        let type_ref = descriptor.type_ref();
        debug!(entity = type_ref.name(), "registering entity");

        self.by_name.insert(type_ref.name(), type_ref);
        self.entities.insert(type_ref, descriptor);
        self
    }

    pub fn descriptor(&self, type_ref: &TypeRef) -> Option<&EntityDescriptor> {
        self.entities.get(type_ref)
    }

    /// Registered type carrying the fully-qualified `name`.
    pub fn type_for_name(&self, name: &str) -> Option<TypeRef> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, type_ref: &TypeRef) -> bool {
        self.entities.contains_key(type_ref)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Registered descriptors, in no particular order.
    pub fn descriptors(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.values()
    }
}
