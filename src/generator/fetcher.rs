// src/generator/fetcher.rs
use crate::config::TrafficConfig;
use async_trait::async_trait;
use reqwest::{header::HeaderMap, Client};
use std::error::Error as StdError;

/// Transport-level failure of a single request. Never a status code:
/// a 500 from the target is a successful observation, not a `TransportError`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request could not be sent: {0}")]
    Request(String),

    #[error("response body could not be read: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let description = describe(&err);

        if err.is_timeout() {
            TransportError::Timeout(description)
        } else if err.is_connect() {
            TransportError::Connect(description)
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(description)
        } else if err.is_request() {
            TransportError::Request(description)
        } else {
            TransportError::Other(description)
        }
    }
}

/// Flattens an error and its source chain into one line.
fn describe(err: &dyn StdError) -> String {
    let mut description = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !description.contains(&cause_text) {
            description.push_str(": ");
            description.push_str(&cause_text);
        }
        source = cause.source();
    }

    description
}

/// Performs the network half of a request task.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Issue one request on behalf of `task_id` and return the response
    /// status code.
    async fn fetch(&self, task_id: usize) -> Result<u16, TransportError>;
}

/// GETs the configured target with the configured headers.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    url: String,
    headers: HeaderMap,
}

impl ReqwestFetcher {
    pub fn new(config: &TrafficConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            url: config.url().to_string(),
            headers: config.header_map().clone(),
        })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, task_id: usize) -> Result<u16, TransportError> {
        let response = self
            .client
            .get(&self.url)
            .headers(self.headers.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        tracing::trace!(task_id, status, "response headers received");

        // Drain the body so the exchange is complete and the connection reusable.
        response.bytes().await?;

        Ok(status)
    }
}
