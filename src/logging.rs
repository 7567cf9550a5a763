//! Logging setup for the docvault binary
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary (or whatever embeds the library).

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted before `--log-level`
pub const LOG_ENV: &str = "DOCVAULT_LOG";

/// Install the global fmt subscriber
///
/// `DOCVAULT_LOG` takes precedence over `level` when set. Logs go to stderr so
/// command output on stdout stays clean.
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow!("failed to initialise tracing subscriber: {}", e))
}
