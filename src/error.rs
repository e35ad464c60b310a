//! Error types for vaultmap.
//!
//! Each layer has its own error enum; [`Error`] wraps them so callers can
//! propagate everything with `?` and still match on the layer that failed.

use thiserror::Error;

/// Top-level error returned by all fallible vaultmap operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend offers no primitive for the requested operation.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Backend transport errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("failed to delete {path}: {reason}")]
    Delete { path: String, reason: String },

    #[error("failed to list {path}: {reason}")]
    List { path: String, reason: String },

    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("corrupt secret at {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

/// Entity metadata and instantiation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("cannot instantiate {0}")]
    NotInstantiable(String),

    #[error("{entity} has no property named '{property}'")]
    UnknownProperty { entity: String, property: String },

    #[error("{0} has no identifier value")]
    MissingId(String),

    #[error("expected entity of type {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },
}

/// Value coercion errors between stored documents and declared property types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("cannot convert {value} to {target}")]
    Incompatible { value: String, target: String },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: String },

    #[error("cannot store non-finite number {0}")]
    NonFiniteFloat(f64),

    #[error("map key '{0}' is reserved for type hints")]
    ReservedKey(String),
}

impl ConversionError {
    pub(crate) fn incompatible(value: impl ToString, target: impl ToString) -> Self {
        Self::Incompatible {
            value: value.to_string(),
            target: target.to_string(),
        }
    }
}

/// Input validation errors for ids and keyspaces.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("id cannot be empty")]
    EmptyId,

    #[error("invalid id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    #[error("keyspace cannot be empty")]
    EmptyKeyspace,

    #[error("invalid keyspace '{keyspace}': {reason}")]
    InvalidKeyspace { keyspace: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
