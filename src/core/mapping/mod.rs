//! Entity mapping metadata.
//!
//! Rust has no runtime reflection, so every mappable type describes itself
//! once through an [`EntityDescriptor`]: its identifier property, its ordered
//! persistent properties with their declared [`PropertyType`], and how to
//! create a blank instance. Instances expose their properties by name as
//! [`PropertyValue`]s through the object-safe [`Entity`] trait.
//!
//! The [`persistent_entity!`](crate::persistent_entity) macro generates all
//! of this for a plain struct:
//!
//! ```
//! use vaultmap::persistent_entity;
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! pub struct Person {
//!     id: Option<String>,
//!     name: String,
//!     age: u32,
//! }
//!
//! persistent_entity!(Person {
//!     #[id] id: Option<String>,
//!     name: String,
//!     age: u32,
//! });
//! ```

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{ConversionError, Result};

mod context;
mod property;

pub use context::MappingContext;
pub use property::Property;

/// Runtime reference to a Rust type.
///
/// Equality and hashing use the [`TypeId`]; the qualified name is kept for
/// aliases and diagnostics.
#[derive(Clone, Copy)]
pub struct TypeRef {
    id: TypeId,
    name: &'static str,
}

impl TypeRef {
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully-qualified type name, e.g. `app::model::Person`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, without generic arguments.
    pub fn simple_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Declared reference to a concrete persistent entity type.
///
/// Carries the type's descriptor constructor so nested entities can be read
/// without registering them in a [`MappingContext`] first.
#[derive(Clone, Copy)]
pub struct EntityRef {
    type_ref: TypeRef,
    describe: fn() -> EntityDescriptor,
}

impl EntityRef {
    pub fn of<T: PersistentEntity>() -> Self {
        Self {
            type_ref: TypeRef::of::<T>(),
            describe: T::descriptor,
        }
    }

    pub fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    pub fn descriptor(&self) -> EntityDescriptor {
        (self.describe)()
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_ref == other.type_ref
    }
}

impl Eq for EntityRef {}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef({})", self.type_ref.name())
    }
}

/// Declared type of a persistent property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Bool,
    Integer,
    Float,
    /// A nested entity. `None` accepts any registered entity type.
    Entity(Option<EntityRef>),
    List(Box<PropertyType>),
    /// String-keyed map of values.
    Map(Box<PropertyType>),
}

impl PropertyType {
    /// Element type of a list or map property.
    pub fn element(&self) -> Option<&PropertyType> {
        match self {
            PropertyType::List(elem) | PropertyType::Map(elem) => Some(elem),
            _ => None,
        }
    }

    /// Concrete entity type declared by an entity property.
    pub fn entity_ref(&self) -> Option<EntityRef> {
        match self {
            PropertyType::Entity(declared) => *declared,
            _ => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::String => f.write_str("string"),
            PropertyType::Bool => f.write_str("bool"),
            PropertyType::Integer => f.write_str("integer"),
            PropertyType::Float => f.write_str("float"),
            PropertyType::Entity(Some(declared)) => write!(f, "entity {}", declared.type_ref()),
            PropertyType::Entity(None) => f.write_str("entity"),
            PropertyType::List(elem) => write!(f, "list<{}>", elem),
            PropertyType::Map(elem) => write!(f, "map<{}>", elem),
        }
    }
}

/// In-memory value of a single property.
#[derive(Debug)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
    Entity(Box<dyn Entity>),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Short description used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Float(_) => "float",
            PropertyValue::String(_) => "string",
            PropertyValue::List(_) => "list",
            PropertyValue::Map(_) => "map",
            PropertyValue::Entity(_) => "entity",
        }
    }

    /// Render a scalar as an identifier string.
    pub fn as_id(&self) -> Option<String> {
        match self {
            PropertyValue::String(s) => Some(s.clone()),
            PropertyValue::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    /// Unwrap a nested entity of concrete type `T`.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::Incompatible` if the value is not an entity
    /// or holds a different entity type.
    pub fn into_entity<T: Entity>(self) -> std::result::Result<T, ConversionError> {
        match self {
            PropertyValue::Entity(entity) => downcast_entity::<T>(entity).map_err(|actual| {
                ConversionError::incompatible(actual, std::any::type_name::<T>())
            }),
            other => Err(ConversionError::incompatible(
                other.kind(),
                std::any::type_name::<T>(),
            )),
        }
    }
}

/// Downcast a boxed entity, returning the actual type name on mismatch.
pub(crate) fn downcast_entity<T: Entity>(
    entity: Box<dyn Entity>,
) -> std::result::Result<T, &'static str> {
    if !entity.as_any().is::<T>() {
        return Err(entity.entity_type().name());
    }
    let actual = entity.entity_type().name();
    entity.into_any().downcast::<T>().map(|e| *e).map_err(|_| actual)
}

/// Object-safe view of a mappable instance.
///
/// Implemented by [`persistent_entity!`](crate::persistent_entity); manual
/// implementations must keep `property`/`set_property` consistent with the
/// descriptor returned by `entity_descriptor`.
pub trait Entity: Any + fmt::Debug + Send + Sync {
    /// Runtime type of this instance.
    fn entity_type(&self) -> TypeRef;

    /// Descriptor of this instance's type.
    fn entity_descriptor(&self) -> EntityDescriptor;

    /// Current value of the named property, `None` if there is no such property.
    fn property(&self, name: &str) -> Option<PropertyValue>;

    /// Assign the named property.
    ///
    /// # Errors
    ///
    /// Returns `MappingError::UnknownProperty` for an undeclared name, or a
    /// `ConversionError` if `value` does not fit the field.
    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<()>;

    fn clone_entity(&self) -> Box<dyn Entity>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn Entity {
    pub fn is<T: Entity>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Identifier value of this instance, rendered as a string.
    pub fn id(&self) -> Option<String> {
        let descriptor = self.entity_descriptor();
        let id = descriptor.id_property()?;
        self.property(id.name())?.as_id()
    }
}

impl Clone for Box<dyn Entity> {
    fn clone(&self) -> Self {
        self.clone_entity()
    }
}

/// A concrete entity type with a static descriptor.
pub trait PersistentEntity: Entity + Default + Clone {
    fn descriptor() -> EntityDescriptor;
}

/// Instantiator used by generated descriptors.
pub fn default_instance<T: PersistentEntity>() -> Box<dyn Entity> {
    Box::new(T::default())
}

/// Name and declared type of one persistent property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    name: &'static str,
    kind: PropertyType,
}

impl PropertyDescriptor {
    pub fn new(name: &'static str, kind: PropertyType) -> Self {
        Self { name, kind }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &PropertyType {
        &self.kind
    }
}

/// Static description of an entity type.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    type_ref: TypeRef,
    keyspace: String,
    id: Option<PropertyDescriptor>,
    properties: Vec<PropertyDescriptor>,
    instantiate: Option<fn() -> Box<dyn Entity>>,
}

impl EntityDescriptor {
    /// Start a descriptor for `type_ref`.
    ///
    /// The keyspace defaults to the simple type name with its first letter
    /// lowercased (`Person` -> `person`).
    pub fn new(type_ref: TypeRef) -> Self {
        Self {
            type_ref,
            keyspace: uncapitalize(type_ref.simple_name()),
            id: None,
            properties: Vec::new(),
            instantiate: None,
        }
    }

    pub fn with_id(mut self, name: &'static str, kind: PropertyType) -> Self {
        self.id = Some(PropertyDescriptor::new(name, kind));
        self
    }

    pub fn with_property(mut self, name: &'static str, kind: PropertyType) -> Self {
        self.properties.push(PropertyDescriptor::new(name, kind));
        self
    }

    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = keyspace.into();
        self
    }

    pub fn with_instantiator(mut self, instantiate: fn() -> Box<dyn Entity>) -> Self {
        self.instantiate = Some(instantiate);
        self
    }

    pub fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn id_property(&self) -> Option<&PropertyDescriptor> {
        self.id.as_ref()
    }

    /// Persistent properties in declaration order, excluding the identifier.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Create a blank instance, if the type has an instantiator.
    pub fn instantiate(&self) -> Option<Box<dyn Entity>> {
        self.instantiate.map(|f| f())
    }
}

fn uncapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Implement [`Entity`], [`PersistentEntity`] and [`Property`] for a struct.
///
/// The struct must derive `Debug`, `Clone` and `Default`. List the persistent
/// fields with their types; mark at most one field, listed first, with
/// `#[id]`. The identifier is stored as the document id rather than in the
/// body.
///
/// ```
/// use vaultmap::persistent_entity;
///
/// #[derive(Debug, Clone, Default)]
/// struct Address {
///     street: String,
///     zip: Option<String>,
/// }
///
/// persistent_entity!(Address { street: String, zip: Option<String> });
/// ```
#[macro_export]
macro_rules! persistent_entity {
    (@impl $entity:ident, [$($id:ident : $id_ty:ty)?], [$($field:ident : $ty:ty),*]) => {
        impl $crate::Entity for $entity {
            fn entity_type(&self) -> $crate::TypeRef {
                $crate::TypeRef::of::<Self>()
            }

            fn entity_descriptor(&self) -> $crate::EntityDescriptor {
                <Self as $crate::PersistentEntity>::descriptor()
            }

            fn property(&self, name: &str) -> ::std::option::Option<$crate::PropertyValue> {
                match name {
                    $(stringify!($id) => ::std::option::Option::Some(
                        $crate::Property::to_property_value(&self.$id),
                    ),)?
                    $(stringify!($field) => ::std::option::Option::Some(
                        $crate::Property::to_property_value(&self.$field),
                    ),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn set_property(
                &mut self,
                name: &str,
                value: $crate::PropertyValue,
            ) -> $crate::Result<()> {
                match name {
                    $(stringify!($id) => {
                        self.$id = <$id_ty as $crate::Property>::from_property_value(value)?;
                    })?
                    $(stringify!($field) => {
                        self.$field = <$ty as $crate::Property>::from_property_value(value)?;
                    })*
                    _ => {
                        let _ = value;
                        return ::std::result::Result::Err(
                            $crate::error::MappingError::UnknownProperty {
                                entity: ::std::any::type_name::<Self>().to_string(),
                                property: name.to_string(),
                            }
                            .into(),
                        );
                    }
                }
                ::std::result::Result::Ok(())
            }

            fn clone_entity(&self) -> ::std::boxed::Box<dyn $crate::Entity> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }

        impl $crate::PersistentEntity for $entity {
            fn descriptor() -> $crate::EntityDescriptor {
                $crate::EntityDescriptor::new($crate::TypeRef::of::<Self>())
                    $(.with_id(stringify!($id), <$id_ty as $crate::Property>::property_type()))?
                    $(.with_property(stringify!($field), <$ty as $crate::Property>::property_type()))*
                    .with_instantiator($crate::default_instance::<Self>)
            }
        }

        impl $crate::Property for $entity {
            fn property_type() -> $crate::PropertyType {
                $crate::PropertyType::Entity(::std::option::Option::Some(
                    $crate::EntityRef::of::<Self>(),
                ))
            }

            fn to_property_value(&self) -> $crate::PropertyValue {
                $crate::PropertyValue::Entity(::std::boxed::Box::new(
                    ::std::clone::Clone::clone(self),
                ))
            }

            fn from_property_value(
                value: $crate::PropertyValue,
            ) -> ::std::result::Result<Self, $crate::error::ConversionError> {
                value.into_entity::<Self>()
            }
        }
    };
    ($entity:ident { #[id] $id:ident : $id_ty:ty $(, $field:ident : $ty:ty)* $(,)? }) => {
        $crate::persistent_entity!(@impl $entity, [$id : $id_ty], [$($field : $ty),*]);
    };
    ($entity:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        $crate::persistent_entity!(@impl $entity, [], [$($field : $ty),*]);
    };
}
