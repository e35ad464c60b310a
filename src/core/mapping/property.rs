//! Field-level conversion between Rust values and [`PropertyValue`]s.

use std::collections::BTreeMap;

use super::{Entity, PropertyType, PropertyValue};
use crate::error::ConversionError;

/// A Rust type usable as a persistent property.
pub trait Property: Sized {
    /// Declared type recorded in the entity descriptor.
    fn property_type() -> PropertyType;

    fn to_property_value(&self) -> PropertyValue;

    /// Rebuild the field from a value already coerced to `property_type()`.
    fn from_property_value(value: PropertyValue) -> Result<Self, ConversionError>;
}

impl Property for String {
    fn property_type() -> PropertyType {
        PropertyType::String
    }

    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::String(self.clone())
    }

    fn from_property_value(value: PropertyValue) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::String(s) => Ok(s),
            other => Err(ConversionError::incompatible(other.kind(), "string")),
        }
    }
}

impl Property for bool {
    fn property_type() -> PropertyType {
        PropertyType::Bool
    }

    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Bool(*self)
    }

    fn from_property_value(value: PropertyValue) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::Bool(b) => Ok(b),
            other => Err(ConversionError::incompatible(other.kind(), "bool")),
        }
    }
}

macro_rules! integer_property {
    ($($ty:ty),*) => {
        $(
            impl Property for $ty {
                fn property_type() -> PropertyType {
                    PropertyType::Integer
                }

                fn to_property_value(&self) -> PropertyValue {
                    PropertyValue::Integer(i64::from(*self))
                }

                fn from_property_value(value: PropertyValue) -> Result<Self, ConversionError> {
                    match value {
                        PropertyValue::Integer(i) => <$ty>::try_from(i).map_err(|_| {
                            ConversionError::OutOfRange {
                                value: i.to_string(),
                                target: stringify!($ty).to_string(),
                            }
                        }),
                        other => Err(ConversionError::incompatible(other.kind(), stringify!($ty))),
                    }
                }
            }
        )*
    };
}

integer_property!(i8, i16, i32, i64, u8, u16, u32);

impl Property for f64 {
    fn property_type() -> PropertyType {
        PropertyType::Float
    }

    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Float(*self)
    }

    fn from_property_value(value: PropertyValue) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::Float(f) => Ok(f),
            other => Err(ConversionError::incompatible(other.kind(), "f64")),
        }
    }
}

impl Property for f32 {
    fn property_type() -> PropertyType {
        PropertyType::Float
    }

    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Float(f64::from(*self))
    }

    fn from_property_value(value: PropertyValue) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::Float(f) if f.is_finite() && f.abs() > f64::from(f32::MAX) => {
                Err(ConversionError::OutOfRange {
                    value: f.to_string(),
                    target: "f32".to_string(),
                })
            }
            PropertyValue::Float(f) => Ok(f as f32),
            other => Err(ConversionError::incompatible(other.kind(), "f32")),
        }
    }
}

impl<T: Property> Property for Option<T> {
    fn property_type() -> PropertyType {
        T::property_type()
    }

    fn to_property_value(&self) -> PropertyValue {
        match self {
            Some(value) => value.to_property_value(),
            None => PropertyValue::Null,
        }
    }

    fn from_property_value(value: PropertyValue) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::Null => Ok(None),
            other => T::from_property_value(other).map(Some),
        }
    }
}

impl<T: Property> Property for Vec<T> {
    fn property_type() -> PropertyType {
        PropertyType::List(Box::new(T::property_type()))
    }

    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::List(self.iter().map(Property::to_property_value).collect())
    }

    fn from_property_value(value: PropertyValue) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::List(items) => items.into_iter().map(T::from_property_value).collect(),
            other => Err(ConversionError::incompatible(other.kind(), "list")),
        }
    }
}

impl<T: Property> Property for BTreeMap<String, T> {
    fn property_type() -> PropertyType {
        PropertyType::Map(Box::new(T::property_type()))
    }

    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_property_value()))
                .collect(),
        )
    }

    fn from_property_value(value: PropertyValue) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| T::from_property_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(ConversionError::incompatible(other.kind(), "map")),
        }
    }
}

/// Polymorphic slot: accepts any registered entity type.
impl Property for Box<dyn Entity> {
    fn property_type() -> PropertyType {
        PropertyType::Entity(None)
    }

    fn to_property_value(&self) -> PropertyValue {
        PropertyValue::Entity(self.clone_entity())
    }

    fn from_property_value(value: PropertyValue) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::Entity(entity) => Ok(entity),
            other => Err(ConversionError::incompatible(other.kind(), "entity")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_maps_null() {
        assert!(Option::<String>::from_property_value(PropertyValue::Null)
            .unwrap()
            .is_none());
        assert_eq!(
            Option::<String>::from_property_value(PropertyValue::String("x".into())).unwrap(),
            Some("x".to_string())
        );
        assert!(None::<i64>.to_property_value().is_null());
        assert_eq!(Option::<i64>::property_type(), PropertyType::Integer);
    }

    #[test]
    fn test_integer_range_checks() {
        assert_eq!(u8::from_property_value(PropertyValue::Integer(255)).unwrap(), 255);
        assert!(matches!(
            u8::from_property_value(PropertyValue::Integer(256)),
            Err(ConversionError::OutOfRange { .. })
        ));
        assert!(matches!(
            i32::from_property_value(PropertyValue::String("1".into())),
            Err(ConversionError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_f32_range_check() {
        assert_eq!(f32::from_property_value(PropertyValue::Float(1.5)).unwrap(), 1.5);
        assert!(f32::from_property_value(PropertyValue::Float(1e300)).is_err());
    }

    #[test]
    fn test_vec_and_map() {
        let list = vec!["a".to_string(), "b".to_string()];
        let value = list.to_property_value();
        assert_eq!(Vec::<String>::from_property_value(value).unwrap(), list);
        assert_eq!(
            Vec::<String>::property_type(),
            PropertyType::List(Box::new(PropertyType::String))
        );

        let mut map = BTreeMap::new();
        map.insert("k".to_string(), 3_i64);
        let value = map.to_property_value();
        assert_eq!(
            BTreeMap::<String, i64>::from_property_value(value).unwrap(),
            map
        );
    }

    #[test]
    fn test_vec_element_failure_propagates() {
        let value = PropertyValue::List(vec![PropertyValue::Integer(1), PropertyValue::Bool(true)]);
        assert!(Vec::<i64>::from_property_value(value).is_err());
    }
}
