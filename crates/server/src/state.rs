use std::sync::Arc;
use ticketrush_core::{Config, Dispatcher, MemorySink, TicketStore};

/// Shared application state
pub struct AppState {
    config: Config,
    dispatcher: Arc<Dispatcher>,
    outcomes: Arc<MemorySink>,
}

impl AppState {
    pub fn new(config: Config, dispatcher: Arc<Dispatcher>, outcomes: Arc<MemorySink>) -> Self {
        Self {
            config,
            dispatcher,
            outcomes,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        self.dispatcher.as_ref()
    }

    pub fn store(&self) -> &TicketStore {
        self.dispatcher.store().as_ref()
    }

    /// Recent outcomes retained for the API
    pub fn outcomes(&self) -> &MemorySink {
        self.outcomes.as_ref()
    }
}
