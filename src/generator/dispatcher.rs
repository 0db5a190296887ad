// src/generator/dispatcher.rs
use super::fetcher::{HttpFetcher, ReqwestFetcher, TransportError};
use super::reporter::Reporter;
use super::task::{Observation, Outcome, RequestTask};
use crate::config::TrafficConfig;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Tally of one run, built from the outcomes as they arrive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub status_counts: BTreeMap<u16, usize>,
    pub elapsed: Duration,
}

impl RunSummary {
    fn record(&mut self, outcome: &Outcome) {
        self.completed += 1;
        match outcome.observation {
            Observation::Status(code) => *self.status_counts.entry(code).or_default() += 1,
            Observation::Failed(_) => self.failed += 1,
        }
    }

    /// Outcomes that carried a status code, whatever its class.
    pub fn observed(&self) -> usize {
        self.completed - self.failed
    }

    pub fn count(&self, status: u16) -> usize {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }

    /// Outcomes with a 5xx status.
    pub fn server_errors(&self) -> usize {
        self.status_counts
            .range(500..600)
            .map(|(_, count)| count)
            .sum()
    }
}

/// Runs `num_requests` request tasks with at most `concurrent_workers`
/// of them in flight.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<TrafficConfig>,
    fetcher: Arc<dyn HttpFetcher>,
}

impl Dispatcher {
    pub fn new(config: TrafficConfig, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
        }
    }

    /// Dispatcher that talks HTTP to `config.url()`.
    pub fn from_config(config: TrafficConfig) -> Result<Self> {
        let fetcher = ReqwestFetcher::new(&config).context("Failed to create HTTP client")?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    /// Blocks until every task has produced its outcome. Each outcome is
    /// handed to `reporter` as soon as it arrives, in completion order.
    pub async fn run<R: Reporter + ?Sized>(&self, reporter: &mut R) -> RunSummary {
        let run_id = Uuid::new_v4();
        self.run_inner(reporter)
            .instrument(info_span!("run", %run_id))
            .await
    }

    async fn run_inner<R: Reporter + ?Sized>(&self, reporter: &mut R) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::default();
        let total = self.config.num_requests();

        if total == 0 {
            info!("No requests to send");
            return summary;
        }

        info!(
            url = self.config.url(),
            total,
            workers = self.config.concurrent_workers(),
            "Starting traffic run"
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let admission = tokio::spawn(
            admit(self.config.clone(), self.fetcher.clone(), tx).in_current_span(),
        );

        // Closes once the admission loop and every task have dropped their sender.
        while let Some(outcome) = rx.recv().await {
            reporter.report(&outcome);
            summary.record(&outcome);
        }

        if let Err(e) = admission.await {
            error!("Admission loop failed: {}", e);
        }

        if summary.completed != total {
            warn!(
                "Run ended with {} of {} outcomes",
                summary.completed, total
            );
        }

        summary.elapsed = started.elapsed();
        info!(
            completed = summary.completed,
            failed = summary.failed,
            server_errors = summary.server_errors(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Traffic run complete"
        );

        summary
    }
}

/// Admits task `id` only once a worker slot is free. The slot is held until
/// the task's outcome is on the channel. A task that panics still yields a
/// failed outcome for its id.
async fn admit(
    config: Arc<TrafficConfig>,
    fetcher: Arc<dyn HttpFetcher>,
    outcomes: mpsc::UnboundedSender<Outcome>,
) {
    let slots = Arc::new(Semaphore::new(
        config.concurrent_workers().min(Semaphore::MAX_PERMITS),
    ));

    for id in 0..config.num_requests() {
        let Ok(permit) = slots.clone().acquire_owned().await else {
            error!("Worker slots closed before task {} was admitted", id);
            break;
        };

        let task = RequestTask::new(id);
        let config = config.clone();
        let fetcher = fetcher.clone();
        let outcomes = outcomes.clone();

        tokio::spawn(
            async move {
                let issued_at = task.issued_at();
                let execution = tokio::spawn(
                    async move { task.execute(&config, fetcher.as_ref()).await }.in_current_span(),
                );
                let outcome = match execution.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("Task {} did not finish: {}", id, e);
                        Outcome {
                            id,
                            issued_at,
                            jitter: Duration::ZERO,
                            response_time: Duration::ZERO,
                            observation: Observation::Failed(TransportError::Other(format!(
                                "task aborted: {e}"
                            ))),
                        }
                    }
                };
                if outcomes.send(outcome).is_err() {
                    warn!("Outcome of task {} dropped, reporter is gone", id);
                }
                drop(permit);
            }
            .in_current_span(),
        );
    }
}
