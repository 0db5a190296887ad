// src/generator/task.rs
use super::fetcher::{HttpFetcher, TransportError};
use crate::config::TrafficConfig;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

/// What a request task saw: a status code or a transport failure, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Status(u16),
    Failed(TransportError),
}

/// Terminal result of one request task.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub id: usize,
    pub issued_at: DateTime<Utc>,
    /// Delay slept before the request was sent.
    pub jitter: Duration,
    /// Time spent in the network call alone.
    pub response_time: Duration,
    pub observation: Observation,
}

impl Outcome {
    pub fn status_code(&self) -> Option<u16> {
        match &self.observation {
            Observation::Status(code) => Some(*code),
            Observation::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TransportError> {
        match &self.observation {
            Observation::Status(_) => None,
            Observation::Failed(err) => Some(err),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.observation {
            Observation::Status(code) => write!(f, "Request {}: Status Code {}", self.id, code),
            Observation::Failed(err) => write!(f, "Request {} failed: {}", self.id, err),
        }
    }
}

/// One unit of work: sleep a random jitter, then issue exactly one request.
#[derive(Debug)]
pub struct RequestTask {
    id: usize,
    issued_at: DateTime<Utc>,
}

impl RequestTask {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            issued_at: Utc::now(),
        }
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Runs the task to completion. Transport failures end up in the
    /// returned outcome; nothing is retried.
    pub async fn execute(self, config: &TrafficConfig, fetcher: &dyn HttpFetcher) -> Outcome {
        let (min, max) = config.jitter_bounds();
        let jitter = draw_jitter(min, max);
        debug!(task_id = self.id, jitter_ms = jitter.as_millis() as u64, "applying jitter");
        sleep(jitter).await;

        let started = Instant::now();
        let observation = match fetcher.fetch(self.id).await {
            Ok(code) => Observation::Status(code),
            Err(err) => Observation::Failed(err),
        };
        let response_time = started.elapsed();

        debug!(
            task_id = self.id,
            response_time_ms = response_time.as_millis() as u64,
            "request finished"
        );

        Outcome {
            id: self.id,
            issued_at: self.issued_at,
            jitter,
            response_time,
            observation,
        }
    }
}

/// Uniform draw in `[min, max]`. An inverted range yields `min`.
pub fn draw_jitter(min: Duration, max: Duration) -> Duration {
    if max > min {
        rand::thread_rng().gen_range(min..=max)
    } else {
        min
    }
}
