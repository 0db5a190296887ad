pub mod builder;
pub mod fault;
pub mod handler;
pub mod listener;
mod shutdown;

pub use builder::{BoundServer, ServerBuilder};
pub use fault::FaultInjector;
pub use handler::{MockHandler, DATA_PATH};
pub use shutdown::shutdown_signal;
