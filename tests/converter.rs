//! Converter tests.
//!
//! Exercise the full entity <-> document mapping: nested entities,
//! polymorphic slots, collections, null handling and value coercion.

mod support;
use support::*;

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};
use vaultmap::error::{ConversionError, MappingError};
use vaultmap::{
    ConversionService, DefaultConversionService, DefaultTypeMapper, Entity, EntityRef, Error,
    MappingConfig, MappingConverter, NullHandling, PropertyType, PropertyValue, SecretDocument,
    TypeRef, VaultConverter,
};

/// Refuses strings for non-string properties, otherwise defers to the
/// default service.
struct Strict;

impl ConversionService for Strict {
    fn convert(&self, value: &Value, target: &PropertyType) -> Result<PropertyValue, ConversionError> {
        if value.is_string() && *target != PropertyType::String {
            return Err(ConversionError::Incompatible {
                value: value.to_string(),
                target: target.to_string(),
            });
        }
        DefaultConversionService.convert(value, target)
    }
}

fn converter() -> MappingConverter {
    MappingConverter::new(Arc::new(context()))
}

fn write(converter: &MappingConverter, entity: &dyn Entity) -> SecretDocument {
    let mut document = SecretDocument::new();
    converter.write(entity, &mut document).unwrap();
    document
}

fn read_as<T: vaultmap::PersistentEntity>(
    converter: MappingConverter,
    document: &SecretDocument,
) -> vaultmap::Result<T> {
    let converter: Box<dyn VaultConverter> = Box::new(converter);
    converter.read_as::<T>(document)
}

#[test]
fn test_nested_entity_round_trip() {
    let document = write(&converter(), &walter());

    assert_eq!(document.id(), Some("walter"));
    assert_eq!(
        document.get("address"),
        Some(&json!({
            "street": "308 Negra Arroyo Lane",
            "city": "Albuquerque",
        }))
    );
    assert_eq!(document.get("tags"), Some(&json!(["mentor", "chemist"])));
    assert_eq!(
        document.get("scores"),
        Some(&json!({"chemistry": 99, "teaching": 42}))
    );

    let person: Person = read_as(converter(), &document).unwrap();
    assert_eq!(person, walter());
}

#[test]
fn test_body_keeps_declaration_order() {
    let document = write(&converter(), &walter());
    let keys: Vec<_> = document.key_set().collect();
    assert_eq!(
        keys,
        vec![
            "_class",
            "first_name",
            "last_name",
            "age",
            "active",
            "rating",
            "address",
            "tags",
            "scores"
        ]
    );
}

#[test]
fn test_missing_fields_keep_defaults() {
    let mut document = SecretDocument::with_id("jesse");
    document.put("first_name", "Jesse");
    document.put("last_name", serde_json::Value::Null);

    let person: Person = read_as(converter(), &document).unwrap();
    assert_eq!(person.id.as_deref(), Some("jesse"));
    assert_eq!(person.first_name, "Jesse");
    assert_eq!(person.last_name, None);
    assert_eq!(person.address, None);
    assert!(person.tags.is_empty());
}

#[test]
fn test_scalars_are_coerced() {
    let mut document = SecretDocument::with_id("p");
    document.put("age", "33");
    document.put("active", "yes");
    document.put("rating", "2.5");
    document.put("tags", json!([1, true]));

    let person: Person = read_as(converter(), &document).unwrap();
    assert_eq!(person.age, 33);
    assert!(person.active);
    assert_eq!(person.rating, 2.5);
    assert_eq!(person.tags, vec!["1".to_string(), "true".to_string()]);
}

#[test]
fn test_conversion_failure_aborts_read() {
    let mut document = SecretDocument::with_id("p");
    document.put("age", json!({"years": 3}));

    let err = read_as::<Person>(converter(), &document).unwrap_err();
    assert!(matches!(err, Error::Conversion(ConversionError::Incompatible { .. })));
}

#[test]
fn test_out_of_range_integer_fails() {
    let mut document = SecretDocument::with_id("p");
    document.put("age", -1);

    let err = read_as::<Person>(converter(), &document).unwrap_err();
    assert!(matches!(err, Error::Conversion(ConversionError::OutOfRange { .. })));
}

#[test]
fn test_polymorphic_slot_records_runtime_type() {
    let owner = Owner {
        id: "jane".to_string(),
        pet: Some(Box::new(Cat {
            name: "Tom".to_string(),
            lives: 9,
        })),
    };

    let document = write(&converter(), &owner);
    assert_eq!(
        document.get("pet"),
        Some(&json!({
            "_class": TypeRef::of::<Cat>().name(),
            "name": "Tom",
            "lives": 9,
        }))
    );

    let read: Owner = read_as(converter(), &document).unwrap();
    let pet = read.pet.unwrap();
    assert_eq!(
        pet.downcast_ref::<Cat>(),
        Some(&Cat {
            name: "Tom".to_string(),
            lives: 9
        })
    );
}

#[test]
fn test_polymorphic_slot_without_hint_is_not_instantiable() {
    let mut document = SecretDocument::with_id("jane");
    document.put("pet", json!({"name": "Rex", "good": true}));

    let err = read_as::<Owner>(converter(), &document).unwrap_err();
    assert!(matches!(
        err,
        Error::Mapping(MappingError::NotInstantiable(_))
    ));
}

#[test]
fn test_read_without_target_uses_hint() {
    let document = write(
        &converter(),
        &Dog {
            name: "Rex".to_string(),
            good: true,
        },
    );

    let entity = converter().read(None, &document).unwrap();
    assert!(entity.is::<Dog>());
}

#[test]
fn test_declared_type_wins_over_incompatible_hint() {
    let mut document = SecretDocument::with_id("x");
    document.put("_class", TypeRef::of::<Cat>().name());
    document.put("name", "Rex");

    let entity = converter()
        .read(Some(EntityRef::of::<Dog>()), &document)
        .unwrap();
    assert_eq!(
        entity.downcast_ref::<Dog>(),
        Some(&Dog {
            name: "Rex".to_string(),
            good: false
        })
    );
}

#[test]
fn test_list_of_entities() {
    let garage = Garage {
        id: "g".to_string(),
        addresses: vec![
            Address {
                street: "a".to_string(),
                city: "x".to_string(),
            },
            Address {
                street: "b".to_string(),
                city: "y".to_string(),
            },
        ],
    };

    let document = write(&converter(), &garage);
    assert_eq!(
        document.get("addresses"),
        Some(&json!([
            {"street": "a", "city": "x"},
            {"street": "b", "city": "y"},
        ]))
    );

    let read: Garage = read_as(converter(), &document).unwrap();
    assert_eq!(read, garage);
}

#[test]
fn test_map_ignores_type_key_on_read() {
    let mut document = SecretDocument::with_id("p");
    document.put("scores", json!({"_class": "ignored", "math": 7}));

    let person: Person = read_as(converter(), &document).unwrap();
    assert_eq!(person.scores.len(), 1);
    assert_eq!(person.scores.get("math"), Some(&7));
}

#[test]
fn test_map_with_type_key_fails_on_write() {
    let mut person = walter();
    person.scores.insert("_class".to_string(), 1);

    let mut document = SecretDocument::new();
    let err = converter().write(&person, &mut document).unwrap_err();
    assert!(matches!(
        err,
        Error::Conversion(ConversionError::ReservedKey(ref key)) if key == "_class"
    ));
}

#[test]
fn test_custom_conversion_service() {
    let body = json!({
        "_class": TypeRef::of::<Person>().name(),
        "first_name": "Jesse",
        "age": "27",
    });
    let document = SecretDocument::from_body(body.as_object().unwrap().clone());
    assert_eq!(document.id(), None);

    let person: Person = read_as(converter(), &document).unwrap();
    assert_eq!(person.age, 27);
    assert_eq!(person.id, None);

    let strict = converter().with_conversion_service(Box::new(Strict));
    let err = read_as::<Person>(strict, &document).unwrap_err();
    assert!(matches!(
        err,
        Error::Conversion(ConversionError::Incompatible { ref target, .. }) if target == "integer"
    ));

    let mut document = document;
    document.put("age", 27);
    let strict = converter().with_conversion_service(Box::new(Strict));
    let person: Person = read_as(strict, &document).unwrap();
    assert_eq!(person.first_name, "Jesse");
    assert_eq!(person.age, 27);
}

#[test]
fn test_null_handling_store() {
    let converter = converter().with_null_handling(NullHandling::Store);
    let mut person = walter();
    person.last_name = None;
    person.address = None;

    let document = write(&converter, &person);
    assert_eq!(document.get("last_name"), Some(&serde_json::Value::Null));
    assert_eq!(document.get("address"), Some(&serde_json::Value::Null));

    let read: Person = read_as(converter, &document).unwrap();
    assert_eq!(read, person);
}

#[test]
fn test_non_finite_float_fails_on_write() {
    let mut person = walter();
    person.rating = f64::INFINITY;

    let mut document = SecretDocument::new();
    let err = converter().write(&person, &mut document).unwrap_err();
    assert!(matches!(
        err,
        Error::Conversion(ConversionError::NonFiniteFloat(_))
    ));
}

#[test]
fn test_disabled_type_hints() {
    let context = Arc::new(context());
    let converter = MappingConverter::new(context.clone())
        .with_type_mapper(Box::new(DefaultTypeMapper::new(None, context)));

    let document = write(&converter, &Foo::new("foo-key", "bar"));
    assert_eq!(
        serde_json::Value::Object(document.body().clone()),
        json!({"name": "bar"})
    );

    let foo: Foo = read_as(converter, &document).unwrap();
    assert_eq!(foo, Foo::new("foo-key", "bar"));
}

#[test]
fn test_from_config_aliases() {
    let mut config = MappingConfig::default();
    config
        .aliases
        .insert(TypeRef::of::<Dog>().name().to_string(), "dog".to_string());

    let converter = MappingConverter::from_config(Arc::new(context()), &config).unwrap();
    let document = write(
        &converter,
        &Dog {
            name: "Rex".to_string(),
            good: true,
        },
    );
    assert_eq!(document.get("_class"), Some(&json!("dog")));

    let cat = write(&converter, &Cat::default());
    assert_eq!(cat.get("_class"), Some(&json!(TypeRef::of::<Cat>().name())));

    let entity = converter.read(None, &document).unwrap();
    assert!(entity.is::<Dog>());
}

#[test]
fn test_from_config_custom_key_without_qualified_names() {
    let mut config = MappingConfig::default();
    config.type_key = "@type".to_string();
    config.qualified_names = false;

    let converter = MappingConverter::from_config(Arc::new(context()), &config).unwrap();
    let document = write(&converter, &Foo::new("f", "n"));
    assert!(!document.contains_key("@type"));
    assert!(!document.contains_key("_class"));
}

#[test]
fn test_from_config_unknown_alias_type() {
    let mut config = MappingConfig::default();
    config
        .aliases
        .insert("no::such::Type".to_string(), "x".to_string());

    let err = MappingConverter::from_config(Arc::new(context()), &config).unwrap_err();
    assert!(err.to_string().contains("no::such::Type"));
}

proptest! {
    #[test]
    fn prop_primitive_round_trip(
        id in "[a-z0-9-]{1,16}",
        first_name in ".*",
        age in any::<u32>(),
        active in any::<bool>(),
        rating in -1.0e12f64..1.0e12,
        tags in prop::collection::vec(".*", 0..4),
    ) {
        let person = Person {
            id: Some(id),
            first_name,
            age,
            active,
            rating,
            tags,
            ..Person::default()
        };

        let document = write(&converter(), &person);
        let read: Person = read_as(converter(), &document).unwrap();
        prop_assert_eq!(read, person);
    }
}
