//! Tracing subscriber setup for applications embedding vaultmap.
//!
//! The filter is read from `VAULTMAP_LOG` when set, otherwise it defaults to
//! `vaultmap=debug` (verbose) or `vaultmap=warn`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::core::constants::LOG_ENV;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("vaultmap=debug")
        } else {
            EnvFilter::new("vaultmap=warn")
        }
    })
}

/// Install a global text subscriber.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(verbose: bool) -> bool {
    init_with(verbose, LogFormat::Text)
}

/// Install a global subscriber in the given format.
pub fn init_with(verbose: bool, format: LogFormat) -> bool {
    let registry = tracing_subscriber::registry().with(filter(verbose));

    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).without_time())
            .try_init()
            .is_ok(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(false).without_time())
            .try_init()
            .is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        let _ = init(false);
        assert!(!init_with(true, LogFormat::Json));
    }
}
