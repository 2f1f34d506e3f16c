pub mod config;
pub mod dispatcher;
pub mod metrics;
pub mod outcome;
pub mod pool;
pub mod simulation;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, PoolConfig, ServerConfig,
};
pub use dispatcher::{
    Dispatcher, DispatcherConfig, DispatcherError, DispatcherStatus, PurchaseRequest,
};
pub use outcome::{
    FanoutSink, MemorySink, OutcomeEnvelope, OutcomeEvent, OutcomeSink, RejectReason,
    TracingSink,
};
pub use pool::{
    Allocation, AllocationError, PoolSnapshot, RequesterId, Ticket, TicketId, TicketStore,
};
pub use simulation::{run_simulation, SimulationConfig, SimulationReport};
