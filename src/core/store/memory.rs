//! In-memory secret store.
//!
//! Emulates the Vault KV listing semantics on top of a sorted map. Clones
//! share the same storage, which makes it convenient for tests and for
//! embedding a throwaway store in a process.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::trace;

use super::{VaultOperations, VaultResponse};
use crate::core::constants::PATH_SEPARATOR;
use crate::core::types::Body;
use crate::error::Result;

/// Shared in-memory secret store keyed by full path.
#[derive(Debug, Clone, Default)]
pub struct InMemory {
    secrets: Arc<RwLock<BTreeMap<String, Body>>>,
}

impl InMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of secrets currently stored, across all paths.
    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    /// Raw body stored at `path`.
    pub fn raw(&self, path: &str) -> Option<Body> {
        self.read_guard().get(normalize(path)).cloned()
    }

    /// All stored paths in sorted order.
    pub fn paths(&self) -> Vec<String> {
        self.read_guard().keys().cloned().collect()
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, BTreeMap<String, Body>> {
        self.secrets.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Body>> {
        self.secrets.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches(PATH_SEPARATOR)
}

/// A path ending in the separator names a folder, never a secret.
fn is_folder(path: &str) -> bool {
    path.ends_with(PATH_SEPARATOR)
}

impl VaultOperations for InMemory {
    fn read(&self, path: &str) -> Result<Option<VaultResponse>> {
        trace!(path, "memory read");
        if is_folder(path) {
            return Ok(None);
        }
        Ok(self
            .read_guard()
            .get(normalize(path))
            .cloned()
            .map(VaultResponse::new))
    }

    fn write(&self, path: &str, body: &Body) -> Result<()> {
        trace!(path, fields = body.len(), "memory write");
        self.write_guard()
            .insert(normalize(path).to_string(), body.clone());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        trace!(path, "memory delete");
        if is_folder(path) {
            return Ok(());
        }
        self.write_guard().remove(normalize(path));
        Ok(())
    }

    fn list(&self, path: &str) -> Result<Option<Vec<String>>> {
        let prefix = format!("{}{}", normalize(path), PATH_SEPARATOR);
        let secrets = self.read_guard();

        let children: BTreeSet<String> = secrets
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| {
                let rest = &key[prefix.len()..];
                match rest.find(PATH_SEPARATOR) {
                    Some(idx) => rest[..=idx].to_string(),
                    None => rest.to_string(),
                }
            })
            .collect();

        trace!(path, children = children.len(), "memory list");

        if children.is_empty() {
            return Ok(None);
        }
        Ok(Some(children.into_iter().collect()))
    }
}
