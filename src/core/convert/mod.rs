//! Entity <-> document conversion.
//!
//! [`MappingConverter`] walks an entity's descriptor and its document side by
//! side: scalars go through the [`ConversionService`], nested entities
//! recurse into nested mappings, lists and maps convert element-wise. Type
//! hints are written and read through the configured [`TypeMapper`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::trace;

use crate::core::config::MappingConfig;
use crate::core::document::SecretDocument;
use crate::core::mapping::{
    downcast_entity, Entity, EntityDescriptor, EntityRef, MappingContext, PersistentEntity,
    PropertyType, PropertyValue, TypeRef,
};
use crate::core::types::Body;
use crate::error::{ConfigError, ConversionError, MappingError, Result};

mod conversion;
mod type_mapper;

pub use conversion::{ConversionService, DefaultConversionService};
pub use type_mapper::{
    AliasTable, DefaultTypeMapper, QualifiedNameResolver, TypeAliasResolver, TypeMapper,
};

/// What to do with properties whose value is null on write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullHandling {
    /// Leave the field out of the document.
    #[default]
    Omit,
    /// Store an explicit JSON null.
    Store,
}

/// Reads and writes entities from and to secret documents.
pub trait VaultConverter: Send + Sync {
    /// Build an entity from `source`.
    ///
    /// `target` is the expected entity type; `None` accepts whatever type the
    /// document records.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError` if a stored value does not fit its declared
    /// property type, or `MappingError::NotInstantiable` if no concrete type
    /// can be determined or created.
    fn read(&self, target: Option<EntityRef>, source: &SecretDocument) -> Result<Box<dyn Entity>>;

    /// Write `source` into `sink`, including its id and type hint.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError` if a property value cannot be represented
    /// in a document (e.g. a non-finite float).
    fn write(&self, source: &dyn Entity, sink: &mut SecretDocument) -> Result<()>;
}

impl dyn VaultConverter {
    /// Read a document as a concrete entity type.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`read`](VaultConverter::read), returns
    /// `MappingError::TypeMismatch` if the result is not a `T`.
    pub fn read_as<T: PersistentEntity>(&self, source: &SecretDocument) -> Result<T> {
        let entity = self.read(Some(EntityRef::of::<T>()), source)?;
        downcast_entity::<T>(entity).map_err(|actual| {
            MappingError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                actual: actual.to_string(),
            }
            .into()
        })
    }
}

/// Descriptor-driven [`VaultConverter`].
pub struct MappingConverter {
    context: Arc<MappingContext>,
    type_mapper: Box<dyn TypeMapper>,
    conversions: Box<dyn ConversionService>,
    null_handling: NullHandling,
}

impl fmt::Debug for MappingConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingConverter")
            .field("entities", &self.context.len())
            .field("type_mapper", &self.type_mapper)
            .field("null_handling", &self.null_handling)
            .finish()
    }
}

impl MappingConverter {
    /// Converter with the default type mapper (`_class`, qualified names),
    /// default conversions and null omission.
    pub fn new(context: Arc<MappingContext>) -> Self {
        Self {
            type_mapper: Box::new(DefaultTypeMapper::with_default_key(context.clone())),
            context,
            conversions: Box::new(DefaultConversionService),
            null_handling: NullHandling::default(),
        }
    }

    /// Converter configured from the `[mapping]` section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if an alias names a type that is
    /// not registered in `context`, or if the aliases are not unique.
    pub fn from_config(context: Arc<MappingContext>, config: &MappingConfig) -> Result<Self> {
        let mut resolvers: Vec<Box<dyn TypeAliasResolver>> = Vec::new();

        if !config.aliases.is_empty() {
            let mut table = AliasTable::new();
            for (type_name, alias) in &config.aliases {
                let type_ref =
                    context
                        .type_for_name(type_name)
                        .ok_or_else(|| ConfigError::InvalidValue {
                            field: "aliases",
                            reason: format!("no registered entity named '{}'", type_name),
                        })?;
                table = table.with_type_alias(type_ref, alias.clone())?;
            }
            resolvers.push(Box::new(table));
        }

        if config.qualified_names {
            resolvers.push(Box::new(QualifiedNameResolver::new(context.clone())));
        }

        let type_key = config.type_hints.then_some(config.type_key.as_str());
        let type_mapper = DefaultTypeMapper::with_resolvers(type_key, resolvers);

        Ok(Self::new(context)
            .with_type_mapper(Box::new(type_mapper))
            .with_null_handling(config.null_values))
    }

    pub fn with_type_mapper(mut self, type_mapper: Box<dyn TypeMapper>) -> Self {
        self.type_mapper = type_mapper;
        self
    }

    pub fn with_conversion_service(mut self, conversions: Box<dyn ConversionService>) -> Self {
        self.conversions = conversions;
        self
    }

    pub fn with_null_handling(mut self, null_handling: NullHandling) -> Self {
        self.null_handling = null_handling;
        self
    }

    pub fn set_type_mapper(&mut self, type_mapper: Box<dyn TypeMapper>) {
        self.type_mapper = type_mapper;
    }

    pub fn mapping_context(&self) -> &MappingContext {
        &self.context
    }

    pub fn type_mapper(&self) -> &dyn TypeMapper {
        self.type_mapper.as_ref()
    }

    pub fn null_handling(&self) -> NullHandling {
        self.null_handling
    }

    /// Pick the descriptor to instantiate: the recorded type when it is
    /// compatible with the declared one, else the declared type.
    fn resolve_descriptor(
        &self,
        declared: Option<EntityRef>,
        source: &Body,
    ) -> Result<EntityDescriptor> {
        let recorded = self.type_mapper.read_type(source);

        match (recorded, declared) {
            (Some(recorded), Some(declared)) if recorded != declared.type_ref() => {
                trace!(
                    recorded = recorded.name(),
                    declared = declared.type_ref().name(),
                    "recorded type incompatible with declared type"
                );
                Ok(declared.descriptor())
            }
            (_, Some(declared)) => Ok(declared.descriptor()),
            (Some(recorded), None) => self
                .context
                .descriptor(&recorded)
                .cloned()
                .ok_or_else(|| MappingError::NotInstantiable(recorded.name().to_string()).into()),
            (None, None) => Err(MappingError::NotInstantiable(
                "entity without a type hint".to_string(),
            )
            .into()),
        }
    }

    fn read_entity(
        &self,
        declared: Option<EntityRef>,
        source: &Body,
        id: Option<&str>,
    ) -> Result<Box<dyn Entity>> {
        let descriptor = self.resolve_descriptor(declared, source)?;
        let type_ref = descriptor.type_ref();
        trace!(entity = type_ref.name(), "reading entity");

        let mut entity = descriptor
            .instantiate()
            .ok_or_else(|| MappingError::NotInstantiable(type_ref.name().to_string()))?;

        for property in descriptor.properties() {
            let Some(stored) = source.get(property.name()) else {
                continue;
            };
            if stored.is_null() {
                continue;
            }
            let value = self.read_value(stored, property.kind())?;
            entity.set_property(property.name(), value)?;
        }

        if let Some(id_property) = descriptor.id_property() {
            let stored = match id {
                Some(id) => Some(Value::String(id.to_string())),
                None => source.get(id_property.name()).cloned(),
            };
            if let Some(stored) = stored.filter(|v| !v.is_null()) {
                let value = self.read_value(&stored, id_property.kind())?;
                entity.set_property(id_property.name(), value)?;
            }
        }

        Ok(entity)
    }

    fn read_value(&self, stored: &Value, kind: &PropertyType) -> Result<PropertyValue> {
        if stored.is_null() {
            return Ok(PropertyValue::Null);
        }

        match kind {
            PropertyType::Entity(declared) => match stored {
                Value::Object(nested) => Ok(PropertyValue::Entity(self.read_entity(
                    *declared,
                    nested,
                    None,
                )?)),
                other => Err(ConversionError::incompatible(conversion::describe(other), kind).into()),
            },
            PropertyType::List(elem) => match stored {
                Value::Array(items) => items
                    .iter()
                    .map(|item| self.read_value(item, elem))
                    .collect::<Result<Vec<_>>>()
                    .map(PropertyValue::List),
                other => Err(ConversionError::incompatible(conversion::describe(other), kind).into()),
            },
            // The type key never holds map data, so it is skipped here and
            // refused on write.
            PropertyType::Map(elem) => match stored {
                Value::Object(entries) => entries
                    .iter()
                    .filter(|(key, _)| !self.type_mapper.is_type_key(key))
                    .map(|(key, value)| -> Result<(String, PropertyValue)> {
                        Ok((key.clone(), self.read_value(value, elem)?))
                    })
                    .collect::<Result<_>>()
                    .map(PropertyValue::Map),
                other => Err(ConversionError::incompatible(conversion::describe(other), kind).into()),
            },
            scalar => Ok(self.conversions.convert(stored, scalar)?),
        }
    }

    /// Write `entity`'s properties into `sink`.
    ///
    /// A type hint is added unless the runtime type equals `declared`. The
    /// identifier is returned instead of written when `detach_id` is set.
    fn write_entity(
        &self,
        entity: &dyn Entity,
        declared: Option<TypeRef>,
        sink: &mut Body,
        detach_id: bool,
    ) -> Result<Option<String>> {
        let descriptor = entity.entity_descriptor();
        let type_ref = entity.entity_type();
        trace!(entity = type_ref.name(), "writing entity");

        if declared != Some(type_ref) {
            self.type_mapper.write_type(type_ref, sink);
        }

        let mut id = None;
        if let Some(id_property) = descriptor.id_property() {
            let value = self.property_value(entity, &descriptor, id_property.name())?;
            if detach_id {
                id = value.as_id();
            } else {
                self.put_value(sink, id_property.name(), value, id_property.kind())?;
            }
        }

        for property in descriptor.properties() {
            let value = self.property_value(entity, &descriptor, property.name())?;
            self.put_value(sink, property.name(), value, property.kind())?;
        }

        Ok(id)
    }

    fn property_value(
        &self,
        entity: &dyn Entity,
        descriptor: &EntityDescriptor,
        name: &str,
    ) -> Result<PropertyValue> {
        entity.property(name).ok_or_else(|| {
            MappingError::UnknownProperty {
                entity: descriptor.type_ref().name().to_string(),
                property: name.to_string(),
            }
            .into()
        })
    }

    fn put_value(
        &self,
        sink: &mut Body,
        name: &str,
        value: PropertyValue,
        kind: &PropertyType,
    ) -> Result<()> {
        if value.is_null() && self.null_handling == NullHandling::Omit {
            return Ok(());
        }
        let stored = self.write_value(value, kind)?;
        sink.insert(name.to_string(), stored);
        Ok(())
    }

    fn write_value(&self, value: PropertyValue, kind: &PropertyType) -> Result<Value> {
        let stored = match value {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(b),
            PropertyValue::Integer(i) => Value::Number(i.into()),
            PropertyValue::Float(f) => Value::Number(
                Number::from_f64(f).ok_or(ConversionError::NonFiniteFloat(f))?,
            ),
            PropertyValue::String(s) => Value::String(s),
            PropertyValue::List(items) => {
                let elem = kind.element().cloned().unwrap_or(PropertyType::Entity(None));
                Value::Array(
                    items
                        .into_iter()
                        .map(|item| self.write_value(item, &elem))
                        .collect::<Result<_>>()?,
                )
            }
            PropertyValue::Map(entries) => {
                let elem = kind.element().cloned().unwrap_or(PropertyType::Entity(None));
                let mut nested = Body::new();
                for (key, item) in entries {
                    if self.type_mapper.is_type_key(&key) {
                        return Err(ConversionError::ReservedKey(key).into());
                    }
                    nested.insert(key, self.write_value(item, &elem)?);
                }
                Value::Object(nested)
            }
            PropertyValue::Entity(entity) => {
                let declared = kind.entity_ref().map(|r| r.type_ref());
                let mut nested = Body::new();
                self.write_entity(entity.as_ref(), declared, &mut nested, false)?;
                Value::Object(nested)
            }
        };
        Ok(stored)
    }
}

impl VaultConverter for MappingConverter {
    fn read(&self, target: Option<EntityRef>, source: &SecretDocument) -> Result<Box<dyn Entity>> {
        self.read_entity(target, source.body(), source.id())
    }

    fn write(&self, source: &dyn Entity, sink: &mut SecretDocument) -> Result<()> {
        let id = self.write_entity(source, None, sink.body_mut(), true)?;
        if let Some(id) = id {
            sink.set_id(Some(id));
        }
        Ok(())
    }
}
