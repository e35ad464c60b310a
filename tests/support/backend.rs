//! Instrumented backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vaultmap::core::types::Body;
use vaultmap::error::StoreError;
use vaultmap::{InMemory, Result, VaultOperations, VaultResponse};

#[derive(Debug, Default)]
struct Calls {
    reads: AtomicUsize,
    writes: AtomicUsize,
    deletes: AtomicUsize,
    lists: AtomicUsize,
    fail_delete_after: Mutex<Option<usize>>,
}

/// In-memory backend counting every round-trip.
///
/// Clones share both the store and the counters.
#[derive(Debug, Clone, Default)]
pub struct Counting {
    pub store: InMemory,
    calls: Arc<Calls>,
}

impl Counting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.calls.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.calls.writes.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.calls.deletes.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.calls.lists.load(Ordering::SeqCst)
    }

    /// Total number of backend calls.
    pub fn calls(&self) -> usize {
        self.reads() + self.writes() + self.deletes() + self.lists()
    }

    /// Fail every delete once `n` deletes have succeeded.
    pub fn fail_deletes_after(&self, n: usize) {
        *self.calls.fail_delete_after.lock().unwrap() = Some(n);
    }
}

impl VaultOperations for Counting {
    fn read(&self, path: &str) -> Result<Option<VaultResponse>> {
        self.calls.reads.fetch_add(1, Ordering::SeqCst);
        self.store.read(path)
    }

    fn write(&self, path: &str, body: &Body) -> Result<()> {
        self.calls.writes.fetch_add(1, Ordering::SeqCst);
        self.store.write(path, body)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let done = self.calls.deletes.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = *self.calls.fail_delete_after.lock().unwrap() {
            if done >= limit {
                return Err(StoreError::Delete {
                    path: path.to_string(),
                    reason: "injected failure".to_string(),
                }
                .into());
            }
        }
        self.store.delete(path)
    }

    fn list(&self, path: &str) -> Result<Option<Vec<String>>> {
        self.calls.lists.fetch_add(1, Ordering::SeqCst);
        self.store.list(path)
    }
}
