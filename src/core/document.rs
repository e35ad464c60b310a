//! Secret document model.
//!
//! A [`SecretDocument`] is the backend-facing form of one entity: an ordered
//! field mapping (the secret body) plus an identifier that lives outside the
//! body. Documents are built fresh for every read and write.

use serde_json::Value;

use crate::core::store::VaultResponse;
use crate::core::types::Body;

/// One stored secret: an optional id and an insertion-ordered body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecretDocument {
    id: Option<String>,
    body: Body,
}

impl SecretDocument {
    /// Create an empty document without an id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document bound to `id`.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            body: Body::new(),
        }
    }

    /// Create a document around an existing body, without an id.
    pub fn from_body(body: Body) -> Self {
        Self { id: None, body }
    }

    /// Wrap a backend response, adopting its data as the body.
    pub fn from_response(id: impl Into<String>, response: VaultResponse) -> Self {
        Self {
            id: Some(id.into()),
            body: response.into_data(),
        }
    }

    /// Value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Insert or overwrite a field.
    ///
    /// Overwriting keeps the field at its original position.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.body.insert(key.into(), value.into())
    }

    /// Field names in insertion order.
    pub fn key_set(&self) -> impl Iterator<Item = &str> {
        self.body.keys().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.body.contains_key(key)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Consume the document, returning the body to hand to the backend.
    pub fn into_body(self) -> Body {
        self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
