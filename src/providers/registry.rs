//! Registry Factor Oracle - verification, audit and whitelist sets
//!
//! Deterministic and I/O free. Membership is positive evidence only: an
//! address missing from a set leaves the factor unknown.

use alloy_primitives::Address;
use async_trait::async_trait;
use std::collections::HashSet;

use crate::core::risk_factors::{PartialRiskFactors, RiskFactorOracle};
use crate::models::config::OracleConfig;
use crate::models::errors::AppResult;
use crate::models::types::TransactionIntent;

#[derive(Debug, Clone, Default)]
pub struct RegistryOracle {
    verified: HashSet<Address>,
    audited: HashSet<Address>,
    whitelist: HashSet<Address>,
}

impl RegistryOracle {
    pub fn new(
        verified: HashSet<Address>,
        audited: HashSet<Address>,
        whitelist: HashSet<Address>,
    ) -> Self {
        Self {
            verified,
            audited,
            whitelist,
        }
    }

    pub fn from_config(config: &OracleConfig) -> Self {
        Self::new(
            config.verified_contracts.clone(),
            config.audited_contracts.clone(),
            config.whitelist.clone(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.verified.is_empty() && self.audited.is_empty() && self.whitelist.is_empty()
    }

    pub fn lookup(&self, address: &Address) -> PartialRiskFactors {
        let known = |set: &HashSet<Address>| set.contains(address).then_some(true);
        PartialRiskFactors {
            is_verified: known(&self.verified),
            has_audit: known(&self.audited),
            is_whitelisted: known(&self.whitelist),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RiskFactorOracle for RegistryOracle {
    fn name(&self) -> &'static str {
        "registry"
    }

    async fn collect(&self, intent: &TransactionIntent) -> AppResult<PartialRiskFactors> {
        Ok(intent
            .to
            .map(|to| self.lookup(&to))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_positive_only() {
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);
        let registry = RegistryOracle::new(
            HashSet::from([a]),
            HashSet::from([a]),
            HashSet::from([b]),
        );

        let fa = registry.lookup(&a);
        assert_eq!(fa.is_verified, Some(true));
        assert_eq!(fa.has_audit, Some(true));
        assert_eq!(fa.is_whitelisted, None);

        let fb = registry.lookup(&b);
        assert_eq!(fb.is_verified, None);
        assert_eq!(fb.is_whitelisted, Some(true));
    }

    #[test]
    fn test_empty_registry() {
        assert!(RegistryOracle::from_config(&OracleConfig::default()).is_empty());
    }
}
