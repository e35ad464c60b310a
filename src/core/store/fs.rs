//! Filesystem-based secret storage.
//!
//! Persists each secret as a JSON file under a root directory:
//! `<root>/<keyspace>/<id>.json`. Listing a path returns the file stems and
//! sub-directories (suffixed with `/`) found directly beneath it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::{VaultOperations, VaultResponse};
use crate::core::constants::{PATH_SEPARATOR, SECRET_FILE_EXTENSION};
use crate::core::types::Body;
use crate::error::{Result, StoreError};

/// Filesystem-based secret store rooted at a directory.
#[derive(Debug, Clone)]
pub struct Filesystem {
    root: PathBuf,
}

impl Filesystem {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that a backend path maps to.
    fn dir_path(&self, path: &str) -> Result<PathBuf> {
        let mut dir = self.root.clone();
        for segment in segments(path)? {
            dir.push(segment);
        }
        Ok(dir)
    }

    /// JSON file that a backend path maps to.
    fn file_path(&self, path: &str) -> Result<PathBuf> {
        let segments = segments(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(StoreError::InvalidPath(path.to_string()).into());
        };

        let mut file = self.root.clone();
        for segment in parents {
            file.push(segment);
        }
        file.push(format!("{}.{}", last, SECRET_FILE_EXTENSION));
        Ok(file)
    }
}

/// Split a backend path into segments, rejecting traversal.
fn segments(path: &str) -> Result<Vec<&str>> {
    let trimmed = path.trim_matches(PATH_SEPARATOR);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let parts: Vec<&str> = trimmed.split(PATH_SEPARATOR).collect();
    if parts
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == ".." || s.contains('\\'))
    {
        return Err(StoreError::InvalidPath(path.to_string()).into());
    }
    Ok(parts)
}

impl VaultOperations for Filesystem {
    fn read(&self, path: &str) -> Result<Option<VaultResponse>> {
        // A trailing separator names a folder, never a secret.
        if path.ends_with(PATH_SEPARATOR) {
            return Ok(None);
        }
        let file = self.file_path(path)?;
        trace!(path, file = %file.display(), "filesystem read");

        let contents = match fs::read_to_string(&file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Read {
                    path: path.to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
        };

        let body: Body = serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Some(VaultResponse::new(body)))
    }

    fn write(&self, path: &str, body: &Body) -> Result<()> {
        let file = self.file_path(path)?;
        debug!(path, file = %file.display(), "filesystem write");

        let write_err = |e: std::io::Error| StoreError::Write {
            path: path.to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let contents = serde_json::to_string_pretty(body).map_err(|e| StoreError::Write {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&file, format!("{}\n", contents)).map_err(write_err)?;

        // Restrict permissions on secret files (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&file, fs::Permissions::from_mode(0o600)).map_err(write_err)?;
        }

        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        if path.ends_with(PATH_SEPARATOR) {
            return Ok(());
        }
        let file = self.file_path(path)?;
        debug!(path, file = %file.display(), "filesystem delete");

        match fs::remove_file(&file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Delete {
                path: path.to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }

    fn list(&self, path: &str) -> Result<Option<Vec<String>>> {
        let dir = self.dir_path(path)?;
        trace!(path, dir = %dir.display(), "filesystem list");

        let list_err = |e: std::io::Error| StoreError::List {
            path: path.to_string(),
            reason: e.to_string(),
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(list_err(e).into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(list_err)?;
            let file_type = entry.file_type().map_err(list_err)?;
            let name = entry.file_name().to_string_lossy().to_string();

            if file_type.is_dir() {
                names.push(format!("{}{}", name, PATH_SEPARATOR));
            } else if let Some(stem) = name
                .strip_suffix(SECRET_FILE_EXTENSION)
                .and_then(|s| s.strip_suffix('.'))
            {
                names.push(stem.to_string());
            }
        }

        if names.is_empty() {
            return Ok(None);
        }
        names.sort();
        Ok(Some(names))
    }
}
