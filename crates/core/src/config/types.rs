use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::dispatcher::DispatcherConfig;
use crate::simulation::SimulationConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Ticket pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Number of tickets for sale, fixed for the lifetime of the process
    #[serde(default = "default_total_tickets")]
    pub total_tickets: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            total_tickets: default_total_tickets(),
        }
    }
}

fn default_total_tickets() -> usize {
    10
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.pool.total_tickets, 10);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.dispatcher.min_delay_ms, 100);
        assert!(config.simulation.enabled);
        assert_eq!(config.simulation.buyers, 20);
    }

    #[test]
    fn test_serialize_round_trip_keeps_sections() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[pool]"));
        assert!(toml_str.contains("[dispatcher]"));
        assert!(toml_str.contains("[simulation]"));
    }
}
