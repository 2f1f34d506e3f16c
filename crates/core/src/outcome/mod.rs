//! Per-request allocation outcomes and the sinks that observe them.

mod events;
mod sink;

pub use events::*;
pub use sink::*;
