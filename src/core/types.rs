//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// Body of a secret document: insertion-ordered field name to JSON value.
pub type Body = serde_json::Map<String, serde_json::Value>;

/// A logical collection name, mapped 1:1 to a backend path prefix.
pub type Keyspace = String;

/// A type alias stored under the type hint field.
pub type Alias = String;
