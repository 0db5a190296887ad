// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use backpressure_traffic::{
    config::{load_config, timeout_from_secs, ConfigFile, TrafficConfig},
    generator::{Dispatcher, LogReporter},
    telemetry::init_tracing,
};

const DEFAULT_NUM_REQUESTS: usize = 10;

/// Generate traffic for backpressure testing.
#[derive(Debug, Parser)]
#[command(name = "traffic-generator", version)]
struct Args {
    /// Use verbose debug logger
    #[arg(short, long)]
    verbose: bool,

    /// Total requests to send [default: 10]
    #[arg(short = 'n', long)]
    num_requests: Option<usize>,

    /// Concurrent workers to process requests [default: 1]
    #[arg(short = 'c', long)]
    concurrent_workers: Option<usize>,

    /// Target URL for requests [default: http://localhost:7777/api/v1/query?query=up]
    #[arg(long)]
    url: Option<String>,

    /// Extra request header, repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Lower bound of the per-request jitter [default: 0.01]
    #[arg(long, value_name = "SECONDS")]
    min_delay: Option<f64>,

    /// Upper bound of the per-request jitter [default: 1.0]
    #[arg(long, value_name = "SECONDS")]
    max_delay: Option<f64>,

    /// Per-request timeout [default: 200]
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<f64>,

    /// YAML or JSON file with base settings; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME: VALUE, got {raw:?}"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn build_config(args: Args, file: Option<ConfigFile>) -> Result<TrafficConfig> {
    let mut builder = TrafficConfig::builder().num_requests(DEFAULT_NUM_REQUESTS);

    if let Some(file) = file {
        builder = builder.apply_file(file)?;
    }

    if let Some(n) = args.num_requests {
        builder = builder.num_requests(n);
    }
    if let Some(n) = args.concurrent_workers {
        builder = builder.concurrent_workers(n);
    }
    if let Some(url) = args.url {
        builder = builder.url(url);
    }
    if let Some(secs) = args.min_delay {
        builder = builder.min_delay(secs);
    }
    if let Some(secs) = args.max_delay {
        builder = builder.max_delay(secs);
    }
    if let Some(secs) = args.timeout {
        builder = builder.request_timeout(timeout_from_secs(secs)?);
    }
    if args.verbose {
        builder = builder.verbose(true);
    }

    Ok(builder.headers(args.headers).build()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file = match &args.config {
        Some(path) => Some(load_config(path).await?),
        None => None,
    };

    let config = build_config(args, file).context("Invalid traffic configuration")?;
    init_tracing(config.verbose())?;

    let dispatcher = Dispatcher::from_config(config)?;
    let summary = dispatcher.run(&mut LogReporter).await;

    info!(
        "Sent {} requests: {} answered, {} failed",
        summary.completed,
        summary.observed(),
        summary.failed
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("traffic-generator").chain(argv.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_cli_defaults() {
        let config = build_config(parse(&[]), None).unwrap();

        assert_eq!(config.num_requests(), 10);
        assert_eq!(config.concurrent_workers(), 1);
        assert_eq!(config.url(), "http://localhost:7777/api/v1/query?query=up");
        assert!(!config.verbose());
    }

    #[test]
    fn test_cli_flags() {
        let args = parse(&[
            "-v",
            "-n",
            "25",
            "-c",
            "5",
            "--url",
            "http://127.0.0.1:6999/api/data",
            "-H",
            "X-Tenant: blue",
            "--header",
            "Accept:application/json",
            "--min-delay",
            "0",
            "--max-delay",
            "0.2",
            "--timeout",
            "3",
        ]);
        let config = build_config(args, None).unwrap();

        assert!(config.verbose());
        assert_eq!(config.num_requests(), 25);
        assert_eq!(config.concurrent_workers(), 5);
        assert_eq!(config.url(), "http://127.0.0.1:6999/api/data");
        assert_eq!(config.headers().get("X-Tenant").unwrap(), "blue");
        assert_eq!(config.headers().get("Accept").unwrap(), "application/json");
        assert_eq!(config.min_delay(), 0.0);
        assert_eq!(config.max_delay(), 0.2);
        assert_eq!(config.request_timeout(), std::time::Duration::from_secs(3));
    }

    #[test]
    fn test_flags_override_file() {
        let file = ConfigFile {
            num_requests: Some(100),
            concurrent_workers: Some(8),
            ..Default::default()
        };
        let config = build_config(parse(&["-n", "3"]), Some(file)).unwrap();

        assert_eq!(config.num_requests(), 3);
        assert_eq!(config.concurrent_workers(), 8);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(build_config(parse(&["-c", "0"]), None).is_err());
        assert!(build_config(parse(&["--min-delay", "2", "--max-delay", "1"]), None).is_err());
        assert!(Args::try_parse_from(["traffic-generator", "-n", "-5"]).is_err());
        assert!(Args::try_parse_from(["traffic-generator", "-H", "no-colon"]).is_err());
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Authorization: Bearer a:b").unwrap(),
            ("Authorization".to_string(), "Bearer a:b".to_string())
        );
        assert!(parse_header(": value").is_err());
    }
}
