// src/logging.rs
// =============================================================================
// Sets up `tracing` for the binary.
//
// Logs go to stderr so stdout only ever carries the report (table or JSON).
// The filter comes from --log-level / NO_DEAD_URLS_LOG and uses the usual
// EnvFilter syntax, e.g. "info" or "no_dead_urls=debug,reqwest=warn".
// =============================================================================

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

pub fn init_logging(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .with_context(|| format!("invalid log filter `{}`", filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("could not install the logger: {}", e))
}
