//! Primitive value coercion.
//!
//! Documents written by other tools do not always match the declared Rust
//! types exactly: numbers may arrive as strings, booleans as `"yes"`. The
//! [`ConversionService`] bridges a stored JSON scalar to a declared scalar
//! [`PropertyType`].

use serde_json::Value;

use crate::core::mapping::{PropertyType, PropertyValue};
use crate::error::ConversionError;

/// Converts stored scalars to declared scalar property types.
pub trait ConversionService: Send + Sync {
    /// Convert `value` to `target`.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError` if the value cannot represent `target`,
    /// including when `target` is not a scalar type.
    fn convert(&self, value: &Value, target: &PropertyType) -> Result<PropertyValue, ConversionError>;
}

/// Lenient scalar conversions between strings, numbers and booleans.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConversionService;

impl ConversionService for DefaultConversionService {
    fn convert(&self, value: &Value, target: &PropertyType) -> Result<PropertyValue, ConversionError> {
        if value.is_null() {
            return Ok(PropertyValue::Null);
        }

        match target {
            PropertyType::String => to_string(value),
            PropertyType::Bool => to_bool(value),
            PropertyType::Integer => to_integer(value),
            PropertyType::Float => to_float(value),
            other => Err(ConversionError::incompatible(describe(value), other)),
        }
    }
}

fn to_string(value: &Value) -> Result<PropertyValue, ConversionError> {
    match value {
        Value::String(s) => Ok(PropertyValue::String(s.clone())),
        Value::Number(n) => Ok(PropertyValue::String(n.to_string())),
        Value::Bool(b) => Ok(PropertyValue::String(b.to_string())),
        other => Err(ConversionError::incompatible(describe(other), "string")),
    }
}

fn to_bool(value: &Value) -> Result<PropertyValue, ConversionError> {
    match value {
        Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(PropertyValue::Bool(true)),
            "false" | "off" | "no" | "0" => Ok(PropertyValue::Bool(false)),
            _ => Err(ConversionError::incompatible(describe(value), "bool")),
        },
        other => Err(ConversionError::incompatible(describe(other), "bool")),
    }
}

fn to_integer(value: &Value) -> Result<PropertyValue, ConversionError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(PropertyValue::Integer(i));
            }
            if n.is_u64() {
                return Err(ConversionError::OutOfRange {
                    value: n.to_string(),
                    target: "integer".to_string(),
                });
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(PropertyValue::Integer(f as i64))
                }
                _ => Err(ConversionError::incompatible(describe(value), "integer")),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(PropertyValue::Integer)
            .map_err(|_| ConversionError::incompatible(describe(value), "integer")),
        other => Err(ConversionError::incompatible(describe(other), "integer")),
    }
}

fn to_float(value: &Value) -> Result<PropertyValue, ConversionError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(PropertyValue::Float)
            .ok_or_else(|| ConversionError::incompatible(describe(value), "float")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(PropertyValue::Float)
            .map_err(|_| ConversionError::incompatible(describe(value), "float")),
        other => Err(ConversionError::incompatible(describe(other), "float")),
    }
}

/// Compact rendering of a stored value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    const MAX: usize = 40;

    let rendered = value.to_string();
    if rendered.chars().count() <= MAX {
        return rendered;
    }
    let truncated: String = rendered.chars().take(MAX).collect();
    format!("{}...", truncated)
}
