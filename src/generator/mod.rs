//
// src/generator/mod.rs
//
mod dispatcher;
mod fetcher;
mod reporter;
mod task;

pub use dispatcher::{Dispatcher, RunSummary};
pub use fetcher::{HttpFetcher, ReqwestFetcher, TransportError};
pub use reporter::{LogReporter, Reporter};
pub use task::{draw_jitter, Observation, Outcome, RequestTask};
