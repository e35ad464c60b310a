//! Key-value adapter over a Vault-style backend.
//!
//! Every entity lives at `<keyspace>/<id>`. The adapter converts entities to
//! and from [`SecretDocument`]s and issues one backend round-trip per
//! primitive; bulk operations are built from a listing of the keyspace and
//! are not atomic.

use std::sync::Arc;

use tracing::debug;

use crate::core::convert::{MappingConverter, VaultConverter};
use crate::core::document::SecretDocument;
use crate::core::mapping::{Entity, EntityRef, MappingContext, PersistentEntity};
use crate::core::store::VaultOperations;
use crate::core::types::Keyspace;
use crate::core::validation::{validate_id, validate_keyspace};
use crate::error::{Error, Result};

/// Repository engine storing entities as secrets.
#[derive(Clone)]
pub struct KeyValueAdapter {
    backend: Arc<dyn VaultOperations>,
    converter: Arc<dyn VaultConverter>,
}

impl std::fmt::Debug for KeyValueAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueAdapter").finish_non_exhaustive()
    }
}

impl KeyValueAdapter {
    pub fn new(backend: Arc<dyn VaultOperations>, converter: Arc<dyn VaultConverter>) -> Self {
        Self { backend, converter }
    }

    /// Adapter using a [`MappingConverter`] with default settings.
    pub fn with_context(backend: Arc<dyn VaultOperations>, context: Arc<MappingContext>) -> Self {
        Self::new(backend, Arc::new(MappingConverter::new(context)))
    }

    pub fn converter(&self) -> &dyn VaultConverter {
        self.converter.as_ref()
    }

    /// Store `entity` under `keyspace/id`, returning the written document.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a bad id or keyspace, a conversion error
    /// if the entity cannot be written, or the backend's `StoreError`.
    pub fn put(&self, id: &str, entity: &dyn Entity, keyspace: &str) -> Result<SecretDocument> {
        validate_id(id)?;
        validate_keyspace(keyspace)?;

        let mut document = SecretDocument::with_id(id);
        self.converter.write(entity, &mut document)?;

        let path = create_path(id, keyspace);
        debug!(path = %path, fields = document.len(), "writing secret");
        self.backend.write(&path, document.body())?;

        Ok(document)
    }

    /// Whether `id` is listed in `keyspace`.
    pub fn contains(&self, id: &str, keyspace: &str) -> Result<bool> {
        validate_id(id)?;
        Ok(self.list(keyspace)?.iter().any(|listed| listed == id))
    }

    /// Read the entity at `keyspace/id` using the document's type hint.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    ///
    /// # Errors
    ///
    /// The concrete type comes only from the stored hint, so a document
    /// without one fails with `MappingError::NotInstantiable`. This is always
    /// the case when the converter runs without type hints. Use
    /// [`get_as`](Self::get_as) and the other `_as` forms there. The same
    /// applies to [`delete`](Self::delete), [`get_all_of`](Self::get_all_of)
    /// and [`Entry::value`].
    pub fn get(&self, id: &str, keyspace: &str) -> Result<Option<Box<dyn Entity>>> {
        validate_id(id)?;
        validate_keyspace(keyspace)?;
        self.fetch(id, keyspace, None)
    }

    /// Read the entity at `keyspace/id` as a `T`.
    pub fn get_as<T: PersistentEntity>(&self, id: &str, keyspace: &str) -> Result<Option<T>> {
        validate_id(id)?;
        validate_keyspace(keyspace)?;
        self.fetch_as::<T>(id, keyspace)
    }

    /// Remove and return the entity at `keyspace/id`.
    ///
    /// Nothing is deleted if nothing is stored there.
    pub fn delete(&self, id: &str, keyspace: &str) -> Result<Option<Box<dyn Entity>>> {
        let Some(entity) = self.get(id, keyspace)? else {
            return Ok(None);
        };
        self.remove(id, keyspace)?;
        Ok(Some(entity))
    }

    /// Typed form of [`delete`](Self::delete).
    pub fn delete_as<T: PersistentEntity>(&self, id: &str, keyspace: &str) -> Result<Option<T>> {
        let Some(entity) = self.get_as::<T>(id, keyspace)? else {
            return Ok(None);
        };
        self.remove(id, keyspace)?;
        Ok(Some(entity))
    }

    /// All entities in `keyspace`, in listing order.
    ///
    /// Folder entries in the listing read as absent and are skipped.
    pub fn get_all_of(&self, keyspace: &str) -> Result<Vec<Box<dyn Entity>>> {
        let mut items = Vec::new();
        for id in self.list(keyspace)? {
            if let Some(entity) = self.fetch(&id, keyspace, None)? {
                items.push(entity);
            }
        }
        Ok(items)
    }

    /// Typed form of [`get_all_of`](Self::get_all_of).
    pub fn get_all_of_as<T: PersistentEntity>(&self, keyspace: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        for id in self.list(keyspace)? {
            if let Some(entity) = self.fetch_as::<T>(&id, keyspace)? {
                items.push(entity);
            }
        }
        Ok(items)
    }

    /// Lazy view over the ids of `keyspace`.
    ///
    /// The listing is taken once, up front. Values are read from the backend
    /// only when [`Entry::value`] is called.
    pub fn entries(&self, keyspace: &str) -> Result<Entries<'_>> {
        let ids = self.list(keyspace)?;
        Ok(Entries {
            adapter: self,
            keyspace: keyspace.to_string(),
            ids: ids.into_iter(),
        })
    }

    /// Delete every listed id in `keyspace`.
    ///
    /// Stops at the first backend failure; earlier deletes stay applied.
    pub fn delete_all_of(&self, keyspace: &str) -> Result<()> {
        let ids = self.list(keyspace)?;
        debug!(keyspace = %keyspace, count = ids.len(), "deleting keyspace");
        for id in ids {
            self.remove(&id, keyspace)?;
        }
        Ok(())
    }

    /// Number of ids listed in `keyspace`.
    pub fn count(&self, keyspace: &str) -> Result<usize> {
        Ok(self.list(keyspace)?.len())
    }

    /// Always fails: the backend has no way to enumerate keyspaces.
    pub fn clear(&self) -> Result<()> {
        Err(Error::Unsupported("clear"))
    }

    fn list(&self, keyspace: &str) -> Result<Vec<String>> {
        validate_keyspace(keyspace)?;
        let ids = self.backend.list(keyspace)?.unwrap_or_default();
        debug!(keyspace = %keyspace, count = ids.len(), "listed keyspace");
        Ok(ids)
    }

    fn fetch(
        &self,
        id: &str,
        keyspace: &str,
        target: Option<EntityRef>,
    ) -> Result<Option<Box<dyn Entity>>> {
        let Some(document) = self.read_document(id, keyspace)? else {
            return Ok(None);
        };
        self.converter.read(target, &document).map(Some)
    }

    fn fetch_as<T: PersistentEntity>(&self, id: &str, keyspace: &str) -> Result<Option<T>> {
        let Some(document) = self.read_document(id, keyspace)? else {
            return Ok(None);
        };
        self.converter.read_as::<T>(&document).map(Some)
    }

    fn read_document(&self, id: &str, keyspace: &str) -> Result<Option<SecretDocument>> {
        let path = create_path(id, keyspace);
        debug!(path = %path, "reading secret");
        Ok(self
            .backend
            .read(&path)?
            .map(|response| SecretDocument::from_response(id, response)))
    }

    fn remove(&self, id: &str, keyspace: &str) -> Result<()> {
        let path = create_path(id, keyspace);
        debug!(path = %path, "deleting secret");
        self.backend.delete(&path)
    }
}

fn create_path(id: &str, keyspace: &str) -> String {
    format!("{}/{}", keyspace, id)
}

/// Forward-only iterator over the entries of a keyspace.
///
/// Returned by [`KeyValueAdapter::entries`]. Does not support removal.
#[derive(Debug)]
pub struct Entries<'a> {
    adapter: &'a KeyValueAdapter,
    keyspace: Keyspace,
    ids: std::vec::IntoIter<String>,
}

impl<'a> Entries<'a> {
    /// Release the iterator. Holds no backend resources.
    pub fn close(self) {}
}

impl<'a> Iterator for Entries<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.ids.next()?;
        Some(Entry {
            adapter: self.adapter,
            keyspace: self.keyspace.clone(),
            key,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl ExactSizeIterator for Entries<'_> {}

/// One listed id, with its value read on demand.
#[derive(Debug)]
pub struct Entry<'a> {
    adapter: &'a KeyValueAdapter,
    keyspace: Keyspace,
    key: String,
}

impl Entry<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the current value from the backend.
    ///
    /// Each call is a fresh round-trip; `Ok(None)` if the secret has been
    /// removed since the listing, or if the key names a folder. Needs a
    /// stored type hint, like [`KeyValueAdapter::get`].
    pub fn value(&self) -> Result<Option<Box<dyn Entity>>> {
        self.adapter.fetch(&self.key, &self.keyspace, None)
    }

    /// Typed form of [`value`](Self::value).
    pub fn value_as<T: PersistentEntity>(&self) -> Result<Option<T>> {
        self.adapter.fetch_as::<T>(&self.key, &self.keyspace)
    }
}
