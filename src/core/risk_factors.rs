//! Risk factor model
//!
//! `PartialRiskFactors` is what callers, oracles and the observation pass
//! supply; every field is optional. `RiskFactors` is the resolved view the
//! scorer works on, with absent fields replaced by their safe defaults.

use alloy_primitives::Address;
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::config::ScoringConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    AddressReputation, TransactionAnalysis, TransactionComplexity, TransactionDetails,
    TransactionIntent,
};

/// Age bucket of the destination contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractAge {
    /// Less than a day
    New,
    /// Less than 30 days
    Recent,
    /// Less than a year
    Established,
    Mature,
}

impl ContractAge {
    pub fn from_age_secs(secs: u64) -> Self {
        const DAY: u64 = 86_400;
        match secs {
            s if s < DAY => Self::New,
            s if s < 30 * DAY => Self::Recent,
            s if s < 365 * DAY => Self::Established,
            _ => Self::Mature,
        }
    }
}

macro_rules! risk_factors {
    ($( $(#[$doc:meta])* $field:ident : $ty:ty = $default:expr ),+ $(,)?) => {
        /// Fully resolved factor set consumed by the scorer
        #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
        #[serde(rename_all = "camelCase")]
        pub struct RiskFactors {
            $( $(#[$doc])* pub $field: $ty, )+
        }

        impl Default for RiskFactors {
            /// Safe defaults: absence of evidence never adds risk
            fn default() -> Self {
                Self { $( $field: $default, )+ }
            }
        }

        /// Factors as supplied; `None` means "not known"
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase", default)]
        pub struct PartialRiskFactors {
            $(
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )+
        }

        impl PartialRiskFactors {
            /// Number of factors in the model
            pub const TOTAL_FIELDS: usize = [$(stringify!($field)),+].len();

            /// How many factors carry a value
            pub fn supplied_count(&self) -> usize {
                0 $( + usize::from(self.$field.is_some()) )+
            }

            /// Field-wise union; values already present in `self` win
            pub fn merge(self, other: Self) -> Self {
                Self { $( $field: self.$field.or(other.$field), )+ }
            }

            pub fn resolve(&self) -> RiskFactors {
                let defaults = RiskFactors::default();
                RiskFactors { $( $field: self.$field.unwrap_or(defaults.$field), )+ }
            }
        }
    };
}

risk_factors! {
    // contract security
    is_verified: bool = true,
    has_audit: bool = true,
    is_known_scammer: bool = false,
    /// 0.0 - 1.0
    scam_similarity: f64 = 0.0,
    contract_age: ContractAge = ContractAge::Established,
    // transaction specific
    has_unlimited_approval: bool = false,
    is_high_value: bool = false,
    has_complex_method: bool = false,
    interacts_with_blacklisted: bool = false,
    has_high_slippage: bool = false,
    is_mev_vulnerable: bool = false,
    // user trust
    is_unusual_pattern: bool = true,
    has_interacted_before: bool = false,
    is_whitelisted: bool = false,
    // external
    is_recently_deployed: bool = false,
    is_copycat: bool = false,
    has_security_incidents: bool = false,
    // implementation
    has_reentrancy_risk: bool = false,
    /// 0.0 (single key) - 1.0 (fully decentralized)
    decentralization_score: f64 = 1.0,
    has_admin_functions: bool = false,
}

impl PartialRiskFactors {
    pub fn is_empty(&self) -> bool {
        self.supplied_count() == 0
    }
}

// ============================================
// OBSERVATION
// ============================================

/// Derive the factors the transaction itself reveals.
///
/// Only fields that can actually be observed are set; a parameter-less or
/// malformed classification observes nothing about the call.
pub fn observe(
    intent: &TransactionIntent,
    analysis: &TransactionAnalysis,
    destination: Option<&AddressReputation>,
    counterparties: &[&AddressReputation],
    config: &ScoringConfig,
) -> PartialRiskFactors {
    let mut factors = PartialRiskFactors::default();

    let decoded = !matches!(
        analysis.details,
        TransactionDetails::Undecoded { .. } | TransactionDetails::Malformed { .. }
    );
    if decoded {
        factors.has_unlimited_approval = Some(analysis.is_unlimited_approval());
        factors.has_complex_method =
            Some(analysis.complexity == TransactionComplexity::Complex);
    }

    if let TransactionDetails::Swap { amount_out_min, .. } = &analysis.details {
        let zero_min_out = amount_out_min.map(|m| m.is_zero()).unwrap_or(false);
        factors.has_high_slippage = Some(zero_min_out);
        factors.is_mev_vulnerable =
            Some(zero_min_out || intent.value > config.mev_value_threshold_wei);
    }

    // Reputation only ever raises risk: the default bucket leaves these
    // fields to the oracles.
    if let Some(rep) = destination {
        if rep.is_scam {
            factors.is_known_scammer = Some(true);
        }
        if rep.risk_level > AddressReputation::unknown().risk_level {
            factors.scam_similarity = Some(f64::from(rep.risk_level.min(10)) / 10.0);
        }
    }

    if counterparties.iter().any(|rep| rep.is_scam) {
        factors.interacts_with_blacklisted = Some(true);
    }

    debug!(
        "👀 Observed {} factor(s) from {}",
        factors.supplied_count(),
        analysis.tx_type
    );
    factors
}

// ============================================
// ORACLES
// ============================================

/// External source of risk factors about a transaction's destination
#[async_trait]
pub trait RiskFactorOracle: Send + Sync {
    fn name(&self) -> &'static str;

    async fn collect(&self, intent: &TransactionIntent) -> AppResult<PartialRiskFactors>;
}

/// Runs every configured oracle concurrently under a shared timeout.
///
/// Earlier oracles take precedence on conflicting fields. Failures and
/// timeouts are logged and contribute nothing.
#[derive(Clone)]
pub struct FactorCollector {
    oracles: Vec<Arc<dyn RiskFactorOracle>>,
    timeout: Duration,
}

impl FactorCollector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            oracles: Vec::new(),
            timeout,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn RiskFactorOracle>) -> Self {
        self.oracles.push(oracle);
        self
    }

    pub fn oracle_names(&self) -> Vec<&'static str> {
        self.oracles.iter().map(|o| o.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }

    pub async fn collect(&self, intent: &TransactionIntent) -> PartialRiskFactors {
        if self.oracles.is_empty() {
            return PartialRiskFactors::default();
        }

        let timeout = self.timeout;
        let runs = self.oracles.iter().map(|oracle| async move {
            let result = match tokio::time::timeout(timeout, oracle.collect(intent)).await {
                Ok(result) => result,
                Err(_) => Err(AppError::oracle_timeout(oracle.name(), timeout.as_millis())),
            };
            (oracle.name(), result)
        });

        join_all(runs)
            .await
            .into_iter()
            .fold(PartialRiskFactors::default(), |acc, (name, result)| match result {
                Ok(factors) => {
                    debug!("🔮 Oracle {} supplied {} factor(s)", name, factors.supplied_count());
                    acc.merge(factors)
                }
                Err(e) => {
                    warn!("⚠️ Oracle {} failed: {}", name, e);
                    acc
                }
            })
    }
}

/// Cache key for contract-level factors
pub fn contract_key(chain_id: u64, address: &Address) -> String {
    format!("{}:{:#x}", chain_id, address)
}
