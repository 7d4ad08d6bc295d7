//! Providers Module - Risk Factor Oracles
//!
//! Sources of `PartialRiskFactors` plugged into the `FactorCollector`:
//! a static registry, a JSON-RPC node and a memoizing wrapper.

pub mod cached;
pub mod registry;
pub mod rpc;

pub use cached::*;
pub use registry::*;
pub use rpc::*;

use std::sync::Arc;
use tracing::{info, warn};

use crate::core::risk_factors::FactorCollector;
use crate::models::config::OracleConfig;
use crate::utils::cache::FactorCache;

/// Collector with every oracle the configuration enables, in precedence
/// order: registry first, then the (cached) RPC oracle.
pub fn build_collector(config: &OracleConfig) -> FactorCollector {
    let mut collector = FactorCollector::new(config.factor_timeout);

    let registry = RegistryOracle::from_config(config);
    if !registry.is_empty() {
        collector = collector.with_oracle(Arc::new(registry));
    }

    match RpcFactorOracle::from_config(config) {
        Ok(Some(rpc)) => {
            let cache = FactorCache::with_ttl(config.cache_ttl_secs);
            collector = collector.with_oracle(Arc::new(CachedOracle::new(Arc::new(rpc), cache)));
        }
        Ok(None) => {}
        Err(e) => warn!("⚠️ RPC oracle disabled: {}", e),
    }

    info!("🔮 Factor oracles: {:?}", collector.oracle_names());
    collector
}
