//! Risk Scoring Module
//! Five capped category sub-scores summed into a 0-100 score
//!
//! Category bands (sum to 100):
//! - Contract security: 0-25
//! - Transaction specific: 0-35
//! - User trust: 0-15
//! - External factors: 0-15
//! - Implementation: 0-10

use serde::Serialize;
use tracing::debug;

use crate::core::risk_factors::{ContractAge, PartialRiskFactors, RiskFactors};
use crate::models::config::ScoringConfig;
use crate::models::types::{SecurityRiskLevel, TransactionIntent};

pub const CONTRACT_SECURITY_MAX: i32 = 25;
pub const TRANSACTION_SPECIFIC_MAX: i32 = 35;
pub const USER_TRUST_MAX: i32 = 15;
pub const EXTERNAL_FACTORS_MAX: i32 = 15;
pub const IMPLEMENTATION_MAX: i32 = 10;

/// Scam similarity above this adds contract risk
const SIMILARITY_RISK_THRESHOLD: f64 = 0.7;
/// Scam similarity above this forces at least High
const SIMILARITY_OVERRIDE_THRESHOLD: f64 = 0.8;
const CENTRALIZED_THRESHOLD: f64 = 0.3;

// Flag texts the recommendation engine matches against
pub const FLAG_UNLIMITED_APPROVAL: &str = "Unlimited token approval requested";
pub const FLAG_HIGH_SLIPPAGE: &str = "High slippage tolerance";
pub const FLAG_MEV_VULNERABLE: &str = "Vulnerable to MEV (front-running / sandwich attacks)";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskBreakdown {
    pub contract_security: u8,
    pub transaction_specific: u8,
    pub user_trust: u8,
    pub external_factors: u8,
    pub implementation: u8,
    pub risk_flags: Vec<String>,
    pub protective_flags: Vec<String>,
    pub suggested_mitigations: Vec<String>,
}

impl RiskBreakdown {
    pub fn category_total(&self) -> u8 {
        self.contract_security
            + self.transaction_specific
            + self.user_trust
            + self.external_factors
            + self.implementation
    }
}

/// Scorer output, rebuilt from scratch for every analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScoreResult {
    /// 0 - 100
    pub score: u8,
    pub level: SecurityRiskLevel,
    pub breakdown: RiskBreakdown,
    /// 0.5 - 1.0, share of factors observed rather than defaulted
    pub confidence: f64,
}

impl RiskScoreResult {
    /// Raise the level to at least `floor`, never lowering it
    pub fn with_floor(mut self, floor: SecurityRiskLevel) -> Self {
        self.level = self.level.max(floor);
        self
    }
}

/// Accumulates the textual trail while a category is evaluated
#[derive(Default)]
struct FlagTrail {
    risk_flags: Vec<String>,
    protective_flags: Vec<String>,
    mitigations: Vec<String>,
}

impl FlagTrail {
    fn risk(&mut self, flag: impl Into<String>, mitigation: &str) {
        self.risk_flags.push(flag.into());
        if !self.mitigations.iter().any(|m| m == mitigation) {
            self.mitigations.push(mitigation.to_string());
        }
    }

    fn protective(&mut self, flag: &str) {
        self.protective_flags.push(flag.to_string());
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score an intent against partially known factors
    pub fn score(&self, intent: &TransactionIntent, factors: &PartialRiskFactors) -> RiskScoreResult {
        let mut f = factors.resolve();
        if factors.is_high_value.is_none() {
            f.is_high_value = intent.value > self.config.high_value_threshold_wei;
        }

        let mut trail = FlagTrail::default();
        let contract_security = contract_security(&f, &mut trail);
        let transaction_specific = transaction_specific(&f, &mut trail);
        let user_trust = user_trust(&f, &mut trail);
        let external_factors = external_factors(&f, &mut trail);
        let implementation = implementation(&f, &mut trail);

        let score = contract_security
            + transaction_specific
            + user_trust
            + external_factors
            + implementation;

        let mut level = SecurityRiskLevel::from_score(score);
        if f.is_known_scammer
            || f.interacts_with_blacklisted
            || f.scam_similarity > SIMILARITY_OVERRIDE_THRESHOLD
        {
            level = level.max(SecurityRiskLevel::High);
        }

        let supplied = factors.supplied_count() as f64;
        let total = PartialRiskFactors::TOTAL_FIELDS as f64;
        let confidence = (0.5 + 0.5 * (supplied / total)).min(1.0);

        debug!(
            "📊 Risk score {} {} [contract {}, tx {}, trust {}, external {}, impl {}] confidence {:.2}",
            score,
            level.as_str(),
            contract_security,
            transaction_specific,
            user_trust,
            external_factors,
            implementation,
            confidence
        );

        RiskScoreResult {
            score,
            level,
            breakdown: RiskBreakdown {
                contract_security,
                transaction_specific,
                user_trust,
                external_factors,
                implementation,
                risk_flags: trail.risk_flags,
                protective_flags: trail.protective_flags,
                suggested_mitigations: trail.mitigations,
            },
            confidence,
        }
    }
}

#[inline]
fn clamp(raw: i32, max: i32) -> u8 {
    raw.clamp(0, max) as u8
}

fn contract_security(f: &RiskFactors, trail: &mut FlagTrail) -> u8 {
    let mut s = 0;

    if f.is_verified {
        s += 10;
        trail.protective("Contract source code is verified");
    } else {
        s += 25;
        trail.risk(
            "Contract source code is not verified",
            "Review the contract source on a block explorer before interacting",
        );
    }

    if f.has_audit {
        s -= 10;
        trail.protective("Contract has been audited");
    } else {
        s += 5;
        trail.risk(
            "No security audit on record",
            "Limit exposure to contracts without a public audit",
        );
    }

    if f.is_known_scammer {
        s += 25;
        trail.risk(
            "Address is associated with known scam activity",
            "Do not proceed: the destination is linked to scams",
        );
    }

    if f.scam_similarity > SIMILARITY_RISK_THRESHOLD {
        s += 15;
        trail.risk(
            format!(
                "Closely resembles known scam contracts ({:.0}% similarity)",
                f.scam_similarity * 100.0
            ),
            "Confirm the contract address through official project channels",
        );
    }

    match f.contract_age {
        ContractAge::New => {
            s += 10;
            trail.risk(
                "Contract was deployed less than a day ago",
                "Wait for the contract to build a track record",
            );
        }
        ContractAge::Recent => {
            s += 5;
            trail.risk(
                "Contract is less than a month old",
                "Wait for the contract to build a track record",
            );
        }
        ContractAge::Established => {
            s -= 5;
            trail.protective("Contract has an established history");
        }
        ContractAge::Mature => {
            s -= 10;
            trail.protective("Contract has been live for over a year");
        }
    }

    clamp(s, CONTRACT_SECURITY_MAX)
}

fn transaction_specific(f: &RiskFactors, trail: &mut FlagTrail) -> u8 {
    let mut s = 0;

    if f.has_unlimited_approval {
        s += 20;
        trail.risk(FLAG_UNLIMITED_APPROVAL, "Approve only the amount this transaction needs");
    }
    if f.is_high_value {
        s += 10;
        trail.risk(
            "High-value transaction",
            "Send a small test transaction first",
        );
    }
    if f.has_complex_method {
        s += 5;
        trail.risk(
            "Complex contract method invoked",
            "Simulate the transaction before signing",
        );
    }
    if f.interacts_with_blacklisted {
        s += 25;
        trail.risk(
            "Interacts with a blacklisted address",
            "Do not proceed: a counterparty is blacklisted",
        );
    }
    if f.has_high_slippage {
        s += 10;
        trail.risk(FLAG_HIGH_SLIPPAGE, "Set a maximum slippage of 1% or lower");
    }
    if f.is_mev_vulnerable {
        s += 15;
        trail.risk(FLAG_MEV_VULNERABLE, "Submit through a private transaction relay");
    }

    clamp(s, TRANSACTION_SPECIFIC_MAX)
}

fn user_trust(f: &RiskFactors, trail: &mut FlagTrail) -> u8 {
    let mut s = USER_TRUST_MAX;

    if !f.is_unusual_pattern {
        s -= 5;
        trail.protective("Matches your usual transaction pattern");
    }
    if f.has_interacted_before {
        s -= 10;
        trail.protective("You have interacted with this contract safely before");
    }
    if f.is_whitelisted {
        s -= 15;
        trail.protective("Contract is on your whitelist");
    }

    clamp(s, USER_TRUST_MAX)
}

fn external_factors(f: &RiskFactors, trail: &mut FlagTrail) -> u8 {
    let mut s = 0;

    if f.is_recently_deployed {
        s += 5;
        trail.risk(
            "Contract was deployed within the last week",
            "Wait for the contract to build a track record",
        );
    }
    if f.is_copycat {
        s += 10;
        trail.risk(
            "Contract imitates a legitimate project",
            "Confirm the contract address through official project channels",
        );
    }
    if f.has_security_incidents {
        s += 10;
        trail.risk(
            "Project has prior security incidents",
            "Review the incident history before committing funds",
        );
    }

    clamp(s, EXTERNAL_FACTORS_MAX)
}

fn implementation(f: &RiskFactors, trail: &mut FlagTrail) -> u8 {
    let mut s = 0;

    if f.has_reentrancy_risk {
        s += 7;
        trail.risk(
            "Potential reentrancy vulnerability",
            "Keep the amount exposed to this contract small",
        );
    }
    if f.decentralization_score < CENTRALIZED_THRESHOLD {
        s += 5;
        trail.risk(
            "Contract control is highly centralized",
            "Check who holds the upgrade and admin keys",
        );
    }
    if f.has_admin_functions {
        s += 3;
        trail.risk(
            "Privileged admin functions present",
            "Check who holds the upgrade and admin keys",
        );
    }

    clamp(s, IMPLEMENTATION_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256};

    fn intent(value: U256) -> TransactionIntent {
        TransactionIntent::new(
            Some(Address::repeat_byte(0x11)),
            Bytes::new(),
            value,
            Address::ZERO,
            1,
        )
    }

    fn score(factors: PartialRiskFactors) -> RiskScoreResult {
        RiskScorer::default().score(&intent(U256::ZERO), &factors)
    }

    #[test]
    fn test_defaults_score_low() {
        let r = score(PartialRiskFactors::default());
        assert_eq!(r.score, 15);
        assert_eq!(r.level, SecurityRiskLevel::Low);
        assert_eq!(r.breakdown.user_trust, 15);
        assert_eq!(r.breakdown.contract_security, 0);
        assert_eq!(r.confidence, 0.5);
    }

    #[test]
    fn test_unlimited_approval_adds_twenty() {
        let r = score(PartialRiskFactors {
            has_unlimited_approval: Some(true),
            ..Default::default()
        });
        assert_eq!(r.breakdown.transaction_specific, 20);
        assert_eq!(r.score, 35);
        assert!(r.breakdown.risk_flags.iter().any(|f| f == FLAG_UNLIMITED_APPROVAL));
    }

    #[test]
    fn test_categories_are_clamped() {
        let r = score(PartialRiskFactors {
            is_verified: Some(false),
            has_audit: Some(false),
            is_known_scammer: Some(true),
            scam_similarity: Some(0.95),
            contract_age: Some(ContractAge::New),
            has_unlimited_approval: Some(true),
            is_high_value: Some(true),
            has_complex_method: Some(true),
            interacts_with_blacklisted: Some(true),
            has_high_slippage: Some(true),
            is_mev_vulnerable: Some(true),
            is_recently_deployed: Some(true),
            is_copycat: Some(true),
            has_security_incidents: Some(true),
            has_reentrancy_risk: Some(true),
            decentralization_score: Some(0.0),
            has_admin_functions: Some(true),
            ..Default::default()
        });
        assert_eq!(r.breakdown.contract_security, 25);
        assert_eq!(r.breakdown.transaction_specific, 35);
        assert_eq!(r.breakdown.external_factors, 15);
        assert_eq!(r.breakdown.implementation, 10);
        assert_eq!(r.score, 100);
        assert_eq!(r.level, SecurityRiskLevel::Critical);
    }

    #[test]
    fn test_user_trust_floor() {
        let r = score(PartialRiskFactors {
            is_unusual_pattern: Some(false),
            has_interacted_before: Some(true),
            is_whitelisted: Some(true),
            ..Default::default()
        });
        assert_eq!(r.breakdown.user_trust, 0);
        assert_eq!(r.breakdown.protective_flags.len(), 6);
    }

    #[test]
    fn test_override_forces_high() {
        let r = score(PartialRiskFactors {
            is_known_scammer: Some(true),
            ..Default::default()
        });
        assert!(r.score < 50);
        assert_eq!(r.level, SecurityRiskLevel::High);

        let r = score(PartialRiskFactors {
            scam_similarity: Some(0.85),
            ..Default::default()
        });
        assert!(r.level >= SecurityRiskLevel::High);
    }

    #[test]
    fn test_high_value_inferred_from_intent() {
        let scorer = RiskScorer::default();
        let at = scorer.score(
            &intent(U256::from(1_000_000_000_000_000_000u128)),
            &PartialRiskFactors::default(),
        );
        assert_eq!(at.breakdown.transaction_specific, 0);

        let above = scorer.score(
            &intent(U256::from(1_000_000_000_000_000_001u128)),
            &PartialRiskFactors::default(),
        );
        assert_eq!(above.breakdown.transaction_specific, 10);

        let overridden = scorer.score(
            &intent(U256::from(5_000_000_000_000_000_000u128)),
            &PartialRiskFactors {
                is_high_value: Some(false),
                ..Default::default()
            },
        );
        assert_eq!(overridden.breakdown.transaction_specific, 0);
    }

    #[test]
    fn test_mitigations_are_unique() {
        let r = score(PartialRiskFactors {
            contract_age: Some(ContractAge::New),
            is_recently_deployed: Some(true),
            decentralization_score: Some(0.1),
            has_admin_functions: Some(true),
            ..Default::default()
        });
        let mut seen = std::collections::HashSet::new();
        for m in &r.breakdown.suggested_mitigations {
            assert!(seen.insert(m.clone()), "duplicate mitigation {}", m);
        }
        assert_eq!(r.breakdown.risk_flags.len(), 4);
    }

    #[test]
    fn test_confidence_grows_with_supplied_factors() {
        let r = score(PartialRiskFactors {
            is_verified: Some(true),
            has_audit: Some(true),
            ..Default::default()
        });
        assert!((r.confidence - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_floor_never_lowers() {
        let r = score(PartialRiskFactors {
            is_known_scammer: Some(true),
            ..Default::default()
        });
        assert_eq!(r.clone().with_floor(SecurityRiskLevel::Low).level, SecurityRiskLevel::High);
        assert_eq!(
            r.with_floor(SecurityRiskLevel::Critical).level,
            SecurityRiskLevel::Critical
        );
    }
}
