//! Backend transport for secret documents.
//!
//! The mapping layer treats the secret store as an opaque key/value
//! transport addressed by slash-separated paths. Implementations decide
//! how paths are persisted.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `VaultOperations` trait
//! 2. Add the implementation in a new file (e.g., `http.rs`)
//! 3. Re-export from this module
//!
//! ## Example
//!
//! ```ignore
//! struct Http { /* ... */ }
//!
//! impl VaultOperations for Http {
//!     fn read(&self, path: &str) -> Result<Option<VaultResponse>> {
//!         // GET /v1/<path>, 404 -> Ok(None)
//!     }
//!     fn write(&self, path: &str, body: &Body) -> Result<()> {
//!         // POST /v1/<path>
//!     }
//!     fn delete(&self, path: &str) -> Result<()> {
//!         // DELETE /v1/<path>
//!     }
//!     fn list(&self, path: &str) -> Result<Option<Vec<String>>> {
//!         // LIST /v1/<path>, 404 -> Ok(None)
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::core::types::Body;
use crate::error::Result;

mod fs;
mod memory;

pub use fs::Filesystem;
pub use memory::InMemory;

/// Data returned by a successful backend read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultResponse {
    data: Body,
}

impl VaultResponse {
    pub fn new(data: Body) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Body {
        &self.data
    }

    pub fn into_data(self) -> Body {
        self.data
    }
}

/// Secret store transport.
///
/// All calls may block and may fail. "Not found" is reported as `Ok(None)`
/// by `read` and `list`, never as an error.
pub trait VaultOperations: Send + Sync {
    /// Read the secret stored at `path`.
    ///
    /// # Returns
    ///
    /// `None` if nothing is stored at `path`.
    fn read(&self, path: &str) -> Result<Option<VaultResponse>>;

    /// Create or replace the secret at `path`.
    fn write(&self, path: &str, body: &Body) -> Result<()>;

    /// Delete the secret at `path`. Deleting a missing path succeeds.
    fn delete(&self, path: &str) -> Result<()>;

    /// List the direct children of `path`.
    ///
    /// Nested folders are reported with a trailing `/`.
    ///
    /// # Returns
    ///
    /// `None` if `path` does not exist or has no children.
    fn list(&self, path: &str) -> Result<Option<Vec<String>>>;
}

impl<T> VaultOperations for Arc<T>
where
    T: VaultOperations + ?Sized,
{
    fn read(&self, path: &str) -> Result<Option<VaultResponse>> {
        (**self).read(path)
    }

    fn write(&self, path: &str, body: &Body) -> Result<()> {
        (**self).write(path, body)
    }

    fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path)
    }

    fn list(&self, path: &str) -> Result<Option<Vec<String>>> {
        (**self).list(path)
    }
}

impl<T> VaultOperations for Box<T>
where
    T: VaultOperations + ?Sized,
{
    fn read(&self, path: &str) -> Result<Option<VaultResponse>> {
        (**self).read(path)
    }

    fn write(&self, path: &str, body: &Body) -> Result<()> {
        (**self).write(path, body)
    }

    fn delete(&self, path: &str) -> Result<()> {
        (**self).delete(path)
    }

    fn list(&self, path: &str) -> Result<Option<Vec<String>>> {
        (**self).list(path)
    }
}
