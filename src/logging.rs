//! Subscriber setup for the command-line front end.
//!
//! The library itself only emits `tracing` events; binaries call
//! [`init_logging`] once at start-up.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a stderr fmt layer filtered by `filter` (an `EnvFilter` directive).
pub fn init_logging(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|err| anyhow!("invalid log filter '{filter}': {err}"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .map_err(|err| anyhow!("installing log subscriber: {err}"))
}
