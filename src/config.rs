use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use broadcast_breaker::BreakerConfig;
use broadcast_types::Partner;

use crate::orchestrator::GLOBAL_DEADLINE;

/// Global configuration, loaded from an optional TOML file and
/// overridable by CLI flags / environment variables.
#[derive(Debug, Parser)]
#[command(name = "ev-broadcast-gateway", about = "Concurrent fan-out broadcast gateway")]
pub struct Cli {
    /// Path to a TOML configuration file layering over the defaults.
    #[arg(long, env = "GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP server to.
    #[arg(long, env = "GATEWAY_BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub worker_pool_max_concurrency: usize,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    pub breaker_eviction_idle_hours: u64,
    /// Partner records to seed the repository with at startup.
    pub partners: Vec<Partner>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            worker_pool_max_concurrency: 50,
            cache_capacity: 100,
            cache_ttl_secs: 30 * 60,
            breaker_eviction_idle_hours: 24,
            partners: Vec::new(),
        }
    }
}

/// The fully resolved configuration the binary wires up its collaborators
/// from. `timeout_ms` on each seeded `Partner` is clamped to
/// `GLOBAL_DEADLINE` here, at load time, not at cache-read time.
pub struct GatewayConfig {
    pub bind_addr: String,
    pub worker_pool_max_concurrency: usize,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub breaker_config: BreakerConfig,
    pub breaker_eviction_idle: Duration,
    pub partners: Vec<Partner>,
}

impl GatewayConfig {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let file_config = match &cli.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str(&raw)?
            }
            None => FileConfig::default(),
        };

        let partners = file_config
            .partners
            .into_iter()
            .map(|partner| partner.validated(GLOBAL_DEADLINE.as_millis() as u64))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            bind_addr: cli.bind_addr.clone(),
            worker_pool_max_concurrency: file_config.worker_pool_max_concurrency,
            cache_capacity: file_config.cache_capacity,
            cache_ttl: Duration::from_secs(file_config.cache_ttl_secs),
            breaker_config: BreakerConfig::default(),
            breaker_eviction_idle: Duration::from_secs(file_config.breaker_eviction_idle_hours * 3600),
            partners,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_defaults() {
        let config = FileConfig::default();
        assert_eq!(config.worker_pool_max_concurrency, 50);
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.cache_ttl_secs, 1800);
        assert_eq!(config.breaker_eviction_idle_hours, 24);
        assert!(config.partners.is_empty());
    }

    #[test]
    fn load_with_no_config_file_yields_defaults_and_no_partners() {
        let cli = Cli {
            config: None,
            bind_addr: "127.0.0.1:0".to_string(),
        };
        let config = GatewayConfig::load(&cli).unwrap();
        assert!(config.partners.is_empty());
        assert_eq!(config.worker_pool_max_concurrency, 50);
    }
}
