//! Constants used throughout vaultmap.
//!
//! Centralizes magic strings and configuration values.

/// Default document field holding the type alias (`_class`).
pub const DEFAULT_TYPE_KEY: &str = "_class";

/// Separator between keyspace and id in backend paths.
pub const PATH_SEPARATOR: char = '/';

/// Default configuration file name (vaultmap.toml).
pub const CONFIG_FILE: &str = "vaultmap.toml";

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "VAULTMAP_LOG";

/// File extension used by the filesystem backend.
pub const SECRET_FILE_EXTENSION: &str = "json";
