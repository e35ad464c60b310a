//! Vaultmap - typed entity mapping onto HashiCorp Vault's key/value store.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── core/             # Core library components
//! │   ├── document      # SecretDocument: id + ordered JSON body
//! │   ├── mapping/      # Entity metadata
//! │   │   ├── mod       # Entity trait, descriptors, persistent_entity!
//! │   │   ├── property  # Field <-> PropertyValue conversion
//! │   │   └── context   # MappingContext registry
//! │   ├── convert/      # Entity <-> document conversion
//! │   │   ├── mod       # VaultConverter, MappingConverter
//! │   │   ├── type_mapper # Type hints and alias resolvers
//! │   │   └── conversion  # Scalar coercion
//! │   ├── store/        # Backend transport
//! │   │   ├── mod       # VaultOperations trait
//! │   │   ├── memory    # In-memory backend
//! │   │   └── fs        # Filesystem backend
//! │   ├── adapter       # KeyValueAdapter over a keyspace
//! │   ├── repository    # Typed CRUD facade
//! │   ├── config        # vaultmap.toml management
//! │   └── validation    # Id and keyspace checks
//! ├── logging           # tracing-subscriber setup
//! └── error             # Error types
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vaultmap::{persistent_entity, InMemory, KeyValueAdapter, MappingContext, Repository};
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! pub struct Person {
//!     id: Option<String>,
//!     name: String,
//! }
//!
//! persistent_entity!(Person {
//!     #[id] id: Option<String>,
//!     name: String,
//! });
//!
//! let context = Arc::new(MappingContext::new().with_entity::<Person>());
//! let adapter = KeyValueAdapter::with_context(Arc::new(InMemory::new()), context);
//! let people = Repository::<Person>::new(Arc::new(adapter));
//!
//! let alice = Person { id: Some("alice".into()), name: "Alice".into() };
//! people.save(&alice)?;
//! assert_eq!(people.find_by_id("alice")?, Some(alice));
//! # Ok::<(), vaultmap::Error>(())
//! ```

pub mod core;
pub mod error;
pub mod logging;

pub use crate::core::adapter::{Entries, Entry, KeyValueAdapter};
pub use crate::core::config::{Config, MappingConfig};
pub use crate::core::convert::{
    AliasTable, ConversionService, DefaultConversionService, DefaultTypeMapper, MappingConverter,
    NullHandling, QualifiedNameResolver, TypeAliasResolver, TypeMapper, VaultConverter,
};
pub use crate::core::document::SecretDocument;
pub use crate::core::mapping::{
    default_instance, Entity, EntityDescriptor, EntityRef, MappingContext, PersistentEntity,
    Property, PropertyDescriptor, PropertyType, PropertyValue, TypeRef,
};
pub use crate::core::repository::Repository;
pub use crate::core::store::{Filesystem, InMemory, VaultOperations, VaultResponse};
pub use crate::error::{Error, Result};
