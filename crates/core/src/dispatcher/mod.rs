//! Allocation dispatcher: the concurrency boundary in front of the ticket store.
//!
//! Requests from any number of callers funnel through a single intake
//! channel. A pull loop spawns one allocation task per request; each task
//! waits a randomized processing delay, then takes the store lock for a
//! single allocation and reports the outcome to the configured sink.

mod config;
mod runner;
mod types;

pub use config::DispatcherConfig;
pub use runner::Dispatcher;
pub use types::{DispatcherError, DispatcherStatus, PurchaseRequest};
