// src/config/server.rs
use super::ConfigError;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

const DEFAULT_LATENCY_SECS: f64 = 0.5;
const DEFAULT_ERROR_RATE: f64 = 0.1;
const DEFAULT_PORT: i64 = 6999;
const DEFAULT_HOST: &str = "0.0.0.0";

/// Settings of the mock target server, fixed for the life of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct MockServerConfig {
    latency: Duration,
    error_rate: f64,
    addr: SocketAddr,
}

#[derive(Debug, Deserialize)]
struct ServerEnv {
    latency: f64,
    error_rate: f64,
    port: u16,
    listen_host: String,
}

impl MockServerConfig {
    pub fn new(latency_secs: f64, error_rate: f64) -> Result<Self, ConfigError> {
        let latency = Duration::try_from_secs_f64(latency_secs)
            .map_err(|_| ConfigError::InvalidLatency(latency_secs))?;

        if !(0.0..=1.0).contains(&error_rate) {
            return Err(ConfigError::InvalidErrorRate(error_rate));
        }

        Ok(Self {
            latency,
            error_rate,
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT as u16),
        })
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Reads `LATENCY`, `ERROR_RATE`, `PORT` and `LISTEN_HOST` from the process
    /// environment. Called once at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(::config::Environment::default())
    }

    /// Same as [`MockServerConfig::from_env`] but over an explicit set of
    /// variables instead of the process environment.
    pub fn from_vars(vars: ::config::Map<String, String>) -> Result<Self, ConfigError> {
        Self::from_source(::config::Environment::default().source(Some(vars)))
    }

    fn from_source(source: ::config::Environment) -> Result<Self, ConfigError> {
        let env_err = |e: ::config::ConfigError| ConfigError::Environment(e.to_string());

        let env: ServerEnv = ::config::Config::builder()
            .set_default("latency", DEFAULT_LATENCY_SECS)
            .map_err(env_err)?
            .set_default("error_rate", DEFAULT_ERROR_RATE)
            .map_err(env_err)?
            .set_default("port", DEFAULT_PORT)
            .map_err(env_err)?
            .set_default("listen_host", DEFAULT_HOST)
            .map_err(env_err)?
            .add_source(source)
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(env_err)?;

        let host: IpAddr = env
            .listen_host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(env.listen_host.clone()))?;

        Ok(Self::new(env.latency, env.error_rate)?.with_addr(SocketAddr::new(host, env.port)))
    }

    /// Fixed delay applied before answering `/api/data`.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Probability in `[0, 1]` that `/api/data` answers with a 500.
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}
