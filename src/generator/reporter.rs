// src/generator/reporter.rs
use super::task::{Observation, Outcome};
use tracing::{info, warn};

/// Sink for outcomes, fed in completion order.
pub trait Reporter {
    fn report(&mut self, outcome: &Outcome);
}

/// Emits one log line per outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, outcome: &Outcome) {
        match &outcome.observation {
            Observation::Status(code) => info!(task_id = outcome.id, status = *code, "{outcome}"),
            Observation::Failed(_) => warn!(task_id = outcome.id, "{outcome}"),
        }
    }
}

/// Keeps every outcome in arrival order.
impl Reporter for Vec<Outcome> {
    fn report(&mut self, outcome: &Outcome) {
        self.push(outcome.clone());
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, outcome: &Outcome) {
        (**self).report(outcome);
    }
}
