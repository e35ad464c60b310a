//! Test support utilities for vaultmap integration tests.
//!
//! Provides fixture entities and an instrumented backend.

#![allow(dead_code)]

pub mod backend;
pub mod fixtures;

#[allow(unused_imports)]
pub use backend::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::sync::Arc;

use vaultmap::{KeyValueAdapter, MappingContext, MappingConverter};

/// Adapter, its counting backend and the shared mapping context.
pub struct Test {
    pub backend: Counting,
    pub context: Arc<MappingContext>,
    pub adapter: KeyValueAdapter,
}

impl Test {
    /// Adapter over an empty in-memory store with all fixtures registered.
    pub fn new() -> Self {
        let context = Arc::new(context());
        Self::with_converter(context.clone(), MappingConverter::new(context))
    }

    /// Adapter using a custom converter.
    pub fn with_converter(context: Arc<MappingContext>, converter: MappingConverter) -> Self {
        let backend = Counting::new();
        let adapter = KeyValueAdapter::new(Arc::new(backend.clone()), Arc::new(converter));
        Self {
            backend,
            context,
            adapter,
        }
    }
}

/// Mapping context with every fixture entity registered.
pub fn context() -> MappingContext {
    MappingContext::new()
        .with_entity::<Foo>()
        .with_entity::<Person>()
        .with_entity::<Address>()
        .with_entity::<Owner>()
        .with_entity::<Dog>()
        .with_entity::<Cat>()
        .with_entity::<Garage>()
}
