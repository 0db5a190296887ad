// src/telemetry.rs
use anyhow::{anyhow, Result};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Installs the global fmt subscriber.
///
/// Defaults to INFO, or DEBUG when `verbose` is set. `RUST_LOG` still wins
/// for anything it names, e.g. `RUST_LOG=hyper=debug`.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
