// src/config/models.rs
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

pub const DEFAULT_URL: &str = "http://localhost:7777/api/v1/query?query=up";
pub const DEFAULT_MIN_DELAY_SECS: f64 = 0.01;
pub const DEFAULT_MAX_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_TIMEOUT_SECS: u64 = 200;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("concurrent_workers must be at least 1")]
    NoWorkers,

    #[error("{field} must be a non-negative number of seconds within duration range (got {value})")]
    InvalidDelay { field: &'static str, value: f64 },

    #[error("min_delay ({min}s) must not exceed max_delay ({max}s)")]
    InvertedDelay { min: f64, max: f64 },

    #[error("invalid target url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("request timeout must be a positive, finite number of seconds")]
    InvalidTimeout,

    #[error("latency must be a finite, non-negative number of seconds (got {0})")]
    InvalidLatency(f64),

    #[error("error_rate must be within [0, 1] (got {0})")]
    InvalidErrorRate(f64),

    #[error("invalid listen address {0:?}")]
    InvalidHost(String),

    #[error("failed to read server environment: {0}")]
    Environment(String),
}

/// Converts a user-supplied number of seconds into a request timeout.
pub fn timeout_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    match Duration::try_from_secs_f64(secs) {
        Ok(timeout) if !timeout.is_zero() => Ok(timeout),
        _ => Err(ConfigError::InvalidTimeout),
    }
}

/// Immutable description of one traffic run.
///
/// Only obtainable through [`TrafficConfigBuilder::build`], so every
/// instance satisfies `min_delay <= max_delay` and `concurrent_workers >= 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficConfig {
    url: String,
    headers: BTreeMap<String, String>,
    header_map: HeaderMap,
    min_delay: f64,
    max_delay: f64,
    jitter_bounds: (Duration, Duration),
    num_requests: usize,
    concurrent_workers: usize,
    request_timeout: Duration,
    verbose: bool,
}

impl TrafficConfig {
    pub fn builder() -> TrafficConfigBuilder {
        TrafficConfigBuilder::default()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// The validated headers in wire form.
    pub fn header_map(&self) -> &HeaderMap {
        &self.header_map
    }

    /// Lower jitter bound in seconds.
    pub fn min_delay(&self) -> f64 {
        self.min_delay
    }

    /// Upper jitter bound in seconds.
    pub fn max_delay(&self) -> f64 {
        self.max_delay
    }

    /// Jitter bounds as durations, `min <= max`.
    pub fn jitter_bounds(&self) -> (Duration, Duration) {
        self.jitter_bounds
    }

    pub fn num_requests(&self) -> usize {
        self.num_requests
    }

    pub fn concurrent_workers(&self) -> usize {
        self.concurrent_workers
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            headers: BTreeMap::new(),
            header_map: HeaderMap::new(),
            min_delay: DEFAULT_MIN_DELAY_SECS,
            max_delay: DEFAULT_MAX_DELAY_SECS,
            jitter_bounds: (
                Duration::from_millis(10),
                Duration::from_secs(1),
            ),
            num_requests: 1,
            concurrent_workers: 1,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verbose: false,
        }
    }
}

/// Partial traffic configuration as read from a YAML or JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
    pub min_delay: Option<f64>,
    pub max_delay: Option<f64>,
    pub num_requests: Option<usize>,
    pub concurrent_workers: Option<usize>,
    pub request_timeout_secs: Option<f64>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct TrafficConfigBuilder {
    url: String,
    headers: BTreeMap<String, String>,
    min_delay: f64,
    max_delay: f64,
    num_requests: usize,
    concurrent_workers: usize,
    request_timeout: Duration,
    verbose: bool,
}

impl Default for TrafficConfigBuilder {
    fn default() -> Self {
        let defaults = TrafficConfig::default();
        Self {
            url: defaults.url,
            headers: defaults.headers,
            min_delay: defaults.min_delay,
            max_delay: defaults.max_delay,
            num_requests: defaults.num_requests,
            concurrent_workers: defaults.concurrent_workers,
            request_timeout: defaults.request_timeout,
            verbose: defaults.verbose,
        }
    }
}

impl TrafficConfigBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn min_delay(mut self, secs: f64) -> Self {
        self.min_delay = secs;
        self
    }

    pub fn max_delay(mut self, secs: f64) -> Self {
        self.max_delay = secs;
        self
    }

    /// Sets both jitter bounds at once.
    pub fn jitter(self, min_secs: f64, max_secs: f64) -> Self {
        self.min_delay(min_secs).max_delay(max_secs)
    }

    pub fn num_requests(mut self, n: usize) -> Self {
        self.num_requests = n;
        self
    }

    pub fn concurrent_workers(mut self, n: usize) -> Self {
        self.concurrent_workers = n;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Overlays every value present in `file` onto the builder.
    pub fn apply_file(mut self, file: ConfigFile) -> Result<Self, ConfigError> {
        if let Some(url) = file.url {
            self.url = url;
        }
        if let Some(headers) = file.headers {
            self.headers.extend(headers);
        }
        if let Some(min) = file.min_delay {
            self.min_delay = min;
        }
        if let Some(max) = file.max_delay {
            self.max_delay = max;
        }
        if let Some(n) = file.num_requests {
            self.num_requests = n;
        }
        if let Some(n) = file.concurrent_workers {
            self.concurrent_workers = n;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = timeout_from_secs(secs)?;
        }
        if let Some(verbose) = file.verbose {
            self.verbose = verbose;
        }
        Ok(self)
    }

    pub fn build(self) -> Result<TrafficConfig, ConfigError> {
        if self.concurrent_workers < 1 {
            return Err(ConfigError::NoWorkers);
        }

        let min = delay_from_secs("min_delay", self.min_delay)?;
        let max = delay_from_secs("max_delay", self.max_delay)?;

        if self.min_delay > self.max_delay {
            return Err(ConfigError::InvertedDelay {
                min: self.min_delay,
                max: self.max_delay,
            });
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        validate_url(&self.url)?;
        let header_map = build_header_map(&self.headers)?;

        Ok(TrafficConfig {
            url: self.url,
            headers: self.headers,
            header_map,
            min_delay: self.min_delay,
            max_delay: self.max_delay,
            jitter_bounds: (min, max),
            num_requests: self.num_requests,
            concurrent_workers: self.concurrent_workers,
            request_timeout: self.request_timeout,
            verbose: self.verbose,
        })
    }
}

/// Rejects negative, non-finite and unrepresentably large delays.
fn delay_from_secs(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDelay { field, value })
}

fn validate_url(raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}

fn build_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ConfigError> {
    let mut map = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        let invalid = |reason: String| ConfigError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        map.insert(header_name, header_value);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrafficConfig::builder().build().unwrap();

        assert_eq!(config.url(), DEFAULT_URL);
        assert!(config.headers().is_empty());
        assert_eq!(config.min_delay(), 0.01);
        assert_eq!(config.max_delay(), 1.0);
        assert_eq!(config.num_requests(), 1);
        assert_eq!(config.concurrent_workers(), 1);
        assert_eq!(config.request_timeout(), Duration::from_secs(200));
        assert!(!config.verbose());
    }

    #[test]
    fn test_explicit_values_read_back_unchanged() {
        let config = TrafficConfig::builder()
            .url("http://example.test:8080")
            .header("Authorization", "Bearer abc")
            .header("X-Tenant", "blue")
            .jitter(0.0, 0.5)
            .num_requests(42)
            .concurrent_workers(7)
            .request_timeout(Duration::from_millis(1500))
            .verbose(true)
            .build()
            .unwrap();

        // No trailing slash appended, no header case folding.
        assert_eq!(config.url(), "http://example.test:8080");
        assert_eq!(config.headers().get("Authorization").unwrap(), "Bearer abc");
        assert_eq!(config.headers().get("X-Tenant").unwrap(), "blue");
        assert_eq!(config.min_delay(), 0.0);
        assert_eq!(config.max_delay(), 0.5);
        assert_eq!(config.num_requests(), 42);
        assert_eq!(config.concurrent_workers(), 7);
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));
        assert!(config.verbose());
        assert_eq!(config.header_map().len(), 2);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = TrafficConfig::builder().concurrent_workers(0).build();
        assert_eq!(result.unwrap_err(), ConfigError::NoWorkers);
    }

    #[test]
    fn test_inverted_jitter_rejected() {
        let result = TrafficConfig::builder().jitter(2.0, 1.0).build();
        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvertedDelay { min: 2.0, max: 1.0 }
        );
    }

    #[test]
    fn test_equal_jitter_bounds_allowed() {
        let config = TrafficConfig::builder().jitter(0.3, 0.3).build().unwrap();
        assert_eq!(config.min_delay(), config.max_delay());
    }

    #[test]
    fn test_negative_and_nan_delays_rejected() {
        assert!(matches!(
            TrafficConfig::builder().min_delay(-0.1).build(),
            Err(ConfigError::InvalidDelay { field: "min_delay", .. })
        ));
        assert!(matches!(
            TrafficConfig::builder().max_delay(f64::NAN).build(),
            Err(ConfigError::InvalidDelay { field: "max_delay", .. })
        ));
    }

    #[test]
    fn test_overflowing_delays_rejected() {
        assert!(matches!(
            TrafficConfig::builder().jitter(1e20, 1e20).build(),
            Err(ConfigError::InvalidDelay { field: "min_delay", .. })
        ));
        assert!(matches!(
            TrafficConfig::builder().max_delay(f64::MAX).build(),
            Err(ConfigError::InvalidDelay { field: "max_delay", .. })
        ));
    }

    #[test]
    fn test_jitter_bounds_match_seconds() {
        let config = TrafficConfig::builder().jitter(0.25, 2.0).build().unwrap();
        assert_eq!(
            config.jitter_bounds(),
            (Duration::from_millis(250), Duration::from_secs(2))
        );
        assert_eq!(
            TrafficConfig::default().jitter_bounds(),
            TrafficConfig::builder().build().unwrap().jitter_bounds()
        );
    }

    #[test]
    fn test_zero_requests_is_valid() {
        let config = TrafficConfig::builder().num_requests(0).build().unwrap();
        assert_eq!(config.num_requests(), 0);
    }

    #[test]
    fn test_bad_url_and_scheme_rejected() {
        assert!(matches!(
            TrafficConfig::builder().url("not a url").build(),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            TrafficConfig::builder().url("ftp://localhost/file").build(),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_bad_header_rejected() {
        let result = TrafficConfig::builder().header("bad header", "x").build();
        assert!(matches!(result, Err(ConfigError::InvalidHeader { .. })));

        let result = TrafficConfig::builder().header("X-Ok", "line\nbreak").build();
        assert!(matches!(result, Err(ConfigError::InvalidHeader { .. })));
    }

    #[test]
    fn test_timeout_from_secs() {
        assert_eq!(timeout_from_secs(2.5).unwrap(), Duration::from_millis(2500));
        assert_eq!(timeout_from_secs(0.0), Err(ConfigError::InvalidTimeout));
        assert_eq!(timeout_from_secs(-1.0), Err(ConfigError::InvalidTimeout));
        assert_eq!(timeout_from_secs(f64::INFINITY), Err(ConfigError::InvalidTimeout));
    }

    #[test]
    fn test_file_values_overlay_builder() {
        let file = ConfigFile {
            num_requests: Some(9),
            request_timeout_secs: Some(3.0),
            headers: Some(BTreeMap::from([("X-From".to_string(), "file".to_string())])),
            ..Default::default()
        };

        let config = TrafficConfig::builder()
            .concurrent_workers(3)
            .apply_file(file)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.num_requests(), 9);
        assert_eq!(config.concurrent_workers(), 3);
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.headers().get("X-From").unwrap(), "file");
    }
}
