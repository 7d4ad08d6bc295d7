//! Configuration module for the transaction risk engine
//!
//! Thresholds, oracle endpoints and server binding. `Default` is pure (no
//! environment access) so tests stay deterministic; `from_env` layers the
//! `SENTINEL_*` variables on top.

use alloy_primitives::{Address, U256};
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::utils::constants::{
    CHAIN_ID_ETHEREUM, DEFAULT_CACHE_TTL_SECS, DEFAULT_FACTOR_TIMEOUT_MS, DEFAULT_HIGH_VALUE_WEI,
    DEFAULT_MEV_VALUE_WEI,
};

/// Heuristic thresholds used by the scorer and the observation pass.
/// Uncalibrated, hence configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Value strictly above this is "high value"
    pub high_value_threshold_wei: U256,
    /// Swaps carrying more than this are treated as MEV-exposed
    pub mev_value_threshold_wei: U256,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_value_threshold_wei: U256::from(DEFAULT_HIGH_VALUE_WEI),
            mev_value_threshold_wei: U256::from(DEFAULT_MEV_VALUE_WEI),
        }
    }
}

/// Risk-factor oracle settings
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Budget for each oracle during factor collection
    pub factor_timeout: Duration,
    /// TTL of the contract-level memo cache
    pub cache_ttl_secs: u64,
    /// JSON-RPC endpoint, enables the RPC oracle when set
    pub rpc_url: Option<String>,
    /// Chain served by `rpc_url`
    pub rpc_chain_id: u64,
    /// Etherscan-compatible API base URL
    pub explorer_api_url: Option<String>,
    pub explorer_api_key: Option<String>,
    pub verified_contracts: HashSet<Address>,
    pub audited_contracts: HashSet<Address>,
    /// Contracts the user explicitly trusts
    pub whitelist: HashSet<Address>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            factor_timeout: Duration::from_millis(DEFAULT_FACTOR_TIMEOUT_MS),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            rpc_url: None,
            rpc_chain_id: CHAIN_ID_ETHEREUM,
            explorer_api_url: None,
            explorer_api_key: None,
            verified_contracts: HashSet::new(),
            audited_contracts: HashSet::new(),
            whitelist: HashSet::new(),
        }
    }
}

/// HTTP server binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub oracle: OracleConfig,
    pub server: ServerConfig,
}

impl EngineConfig {
    /// Load from `SENTINEL_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let scoring = ScoringConfig {
            high_value_threshold_wei: env_parse(
                "SENTINEL_HIGH_VALUE_WEI",
                defaults.scoring.high_value_threshold_wei,
            ),
            mev_value_threshold_wei: env_parse(
                "SENTINEL_MEV_VALUE_WEI",
                defaults.scoring.mev_value_threshold_wei,
            ),
        };

        let oracle = OracleConfig {
            factor_timeout: Duration::from_millis(env_parse(
                "SENTINEL_FACTOR_TIMEOUT_MS",
                DEFAULT_FACTOR_TIMEOUT_MS,
            )),
            cache_ttl_secs: env_parse("SENTINEL_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
            rpc_url: env_string("SENTINEL_RPC_URL"),
            rpc_chain_id: env_parse("SENTINEL_RPC_CHAIN_ID", CHAIN_ID_ETHEREUM),
            explorer_api_url: env_string("SENTINEL_EXPLORER_API_URL"),
            explorer_api_key: env_string("SENTINEL_EXPLORER_API_KEY"),
            verified_contracts: env_addresses("SENTINEL_VERIFIED_CONTRACTS"),
            audited_contracts: env_addresses("SENTINEL_AUDITED_CONTRACTS"),
            whitelist: env_addresses("SENTINEL_WHITELIST"),
        };

        // PORT first (container platforms), SENTINEL_PORT for local dev
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("SENTINEL_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.server.port);
        let server = ServerConfig {
            host: env_string("SENTINEL_HOST").unwrap_or(defaults.server.host),
            port,
        };

        if oracle.rpc_url.is_some() {
            info!("🔌 RPC factor oracle configured (endpoint hidden)");
        }
        if oracle.explorer_api_key.is_some() {
            info!("🔑 Explorer API key configured (key hidden)");
        }

        Self {
            scoring,
            oracle,
            server,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env_string(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("⚠️ Ignoring invalid {}='{}', using default", key, raw);
            default
        }),
        None => default,
    }
}

/// Comma-separated address list; invalid entries are skipped with a warning
pub fn parse_address_list(raw: &str) -> HashSet<Address> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match Address::from_str(s) {
            Ok(addr) => Some(addr),
            Err(_) => {
                warn!("⚠️ Skipping invalid address in list: {}", s);
                None
            }
        })
        .collect()
}

fn env_addresses(key: &str) -> HashSet<Address> {
    env_string(key)
        .map(|raw| parse_address_list(&raw))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let cfg = ScoringConfig::default();
        assert_eq!(
            cfg.high_value_threshold_wei,
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert!(cfg.mev_value_threshold_wei > cfg.high_value_threshold_wei);
    }

    #[test]
    fn test_parse_address_list() {
        let list = parse_address_list(
            "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D, not-an-address ,,0xE592427A0AEce92De3Edee1F18E0157C05861564",
        );
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_default_oracle_config() {
        let cfg = OracleConfig::default();
        assert!(cfg.rpc_url.is_none());
        assert_eq!(cfg.factor_timeout, Duration::from_millis(3000));
    }
}
