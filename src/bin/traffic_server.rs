//! Mock target for backpressure experiments.
//!
//! `GET /api/data` sleeps `LATENCY` seconds, then answers 500 with
//! probability `ERROR_RATE`, else 200. Listens on `LISTEN_HOST:PORT`.

use anyhow::{Context, Result};
use backpressure_traffic::{
    config::MockServerConfig,
    server::{shutdown_signal, MockHandler, ServerBuilder},
    telemetry::init_tracing,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(false)?;

    let config = MockServerConfig::from_env().context("Invalid mock server configuration")?;
    info!(
        latency_ms = config.latency().as_millis() as u64,
        error_rate = config.error_rate(),
        "Starting mock target on {}",
        config.addr()
    );

    let server = ServerBuilder::new(config.addr())
        .with_handler(MockHandler::new(config))
        .bind()
        .await?;

    server.serve_with_shutdown(shutdown_signal()).await
}
