//! Memoizing wrapper for contract-level oracles
//!
//! Results depend only on (chain, destination), so they are cached per
//! contract. Failures pass through uncached.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::risk_factors::{contract_key, PartialRiskFactors, RiskFactorOracle};
use crate::models::errors::AppResult;
use crate::models::types::TransactionIntent;
use crate::utils::cache::FactorCache;

pub struct CachedOracle {
    inner: Arc<dyn RiskFactorOracle>,
    cache: FactorCache,
}

impl CachedOracle {
    pub fn new(inner: Arc<dyn RiskFactorOracle>, cache: FactorCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &FactorCache {
        &self.cache
    }
}

#[async_trait]
impl RiskFactorOracle for CachedOracle {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn collect(&self, intent: &TransactionIntent) -> AppResult<PartialRiskFactors> {
        let Some(to) = intent.to else {
            return self.inner.collect(intent).await;
        };

        let key = format!("{}:{}", self.inner.name(), contract_key(intent.chain_id, &to));
        if let Some(factors) = self.cache.get(&key) {
            return Ok(factors);
        }

        let factors = self.inner.collect(intent).await?;
        self.cache.set(&key, factors.clone());
        Ok(factors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::AppError;
    use alloy_primitives::{Address, Bytes, U256};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingOracle {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl RiskFactorOracle for CountingOracle {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn collect(&self, _intent: &TransactionIntent) -> AppResult<PartialRiskFactors> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::rpc_error("boom"));
            }
            Ok(PartialRiskFactors {
                has_audit: Some(false),
                ..Default::default()
            })
        }
    }

    fn intent() -> TransactionIntent {
        TransactionIntent::new(
            Some(Address::repeat_byte(0x11)),
            Bytes::new(),
            U256::ZERO,
            Address::ZERO,
            1,
        )
    }

    #[tokio::test]
    async fn test_second_lookup_is_cached() {
        let inner = Arc::new(CountingOracle {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cached = CachedOracle::new(inner.clone(), FactorCache::new());

        let first = cached.collect(&intent()).await.unwrap();
        let second = cached.collect(&intent()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = Arc::new(CountingOracle {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cached = CachedOracle::new(inner.clone(), FactorCache::new());

        assert!(cached.collect(&intent()).await.is_err());
        assert!(cached.collect(&intent()).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cache().stats().entries, 0);
    }
}
