use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Pool has at least one ticket
/// - Delay range is ordered
/// - Optional dispatcher limits are non-zero when set
/// - Server port is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.pool.total_tickets == 0 {
        return Err(ConfigError::ValidationError(
            "pool.total_tickets must be greater than 0".to_string(),
        ));
    }

    let dispatcher = &config.dispatcher;
    if dispatcher.min_delay_ms > dispatcher.max_delay_ms {
        return Err(ConfigError::ValidationError(format!(
            "dispatcher.min_delay_ms ({}) cannot exceed dispatcher.max_delay_ms ({})",
            dispatcher.min_delay_ms, dispatcher.max_delay_ms
        )));
    }

    if dispatcher.intake_capacity == Some(0) {
        return Err(ConfigError::ValidationError(
            "dispatcher.intake_capacity cannot be 0 (omit it for an unbounded intake)".to_string(),
        ));
    }

    if dispatcher.request_timeout_ms == Some(0) {
        return Err(ConfigError::ValidationError(
            "dispatcher.request_timeout_ms cannot be 0 (omit it to disable the deadline)"
                .to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}
