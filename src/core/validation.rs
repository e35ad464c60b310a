//! Input validation for adapter operations.
//!
//! Ids and keyspaces are joined into backend paths, so both must be free of
//! separators that would change which secret a path addresses.

use crate::core::constants::PATH_SEPARATOR;
use crate::error::{Result, ValidationError};

/// Validate a caller-supplied entity id.
///
/// Ids must be non-empty and cannot contain the path separator.
///
/// # Errors
///
/// Returns `ValidationError` if the id is invalid.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId.into());
    }

    if let Some(position) = id.find(PATH_SEPARATOR) {
        return Err(ValidationError::InvalidId {
            id: id.to_string(),
            reason: format!("contains '{}' at position {}", PATH_SEPARATOR, position + 1),
        }
        .into());
    }

    Ok(())
}

/// Validate a keyspace.
///
/// Keyspaces may be nested (`secret/app`) but cannot be empty or start or
/// end with the separator.
///
/// # Errors
///
/// Returns `ValidationError` if the keyspace is invalid.
pub fn validate_keyspace(keyspace: &str) -> Result<()> {
    if keyspace.is_empty() {
        return Err(ValidationError::EmptyKeyspace.into());
    }

    if keyspace.starts_with(PATH_SEPARATOR) || keyspace.ends_with(PATH_SEPARATOR) {
        return Err(ValidationError::InvalidKeyspace {
            keyspace: keyspace.to_string(),
            reason: format!("cannot start or end with '{}'", PATH_SEPARATOR),
        }
        .into());
    }

    Ok(())
}
