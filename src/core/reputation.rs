//! Address reputation heuristic
//!
//! Ordered rules over static lists and textual patterns, first match wins.
//! The heuristic sits behind `ReputationOracle` so a networked source can
//! replace it; lookup failures are mapped to the default bucket by callers.

use std::collections::HashSet;

use crate::models::errors::AppResult;
use crate::models::types::AddressReputation;
use crate::utils::constants::{
    KNOWN_SCAM_ADDRESSES, KNOWN_SUSPICIOUS_ADDRESSES, KNOWN_UTILITY_ADDRESSES, LEET_PATTERNS,
    REPEATED_CHAR_RUN,
};

/// Source of address reputation
pub trait ReputationOracle: Send + Sync {
    fn check_address(&self, address: &str) -> AppResult<AddressReputation>;
}

/// List- and pattern-based reputation, deterministic
#[derive(Debug, Clone)]
pub struct HeuristicReputation {
    scam: HashSet<String>,
    suspicious: HashSet<String>,
    utility: HashSet<String>,
}

impl Default for HeuristicReputation {
    fn default() -> Self {
        Self::new(
            KNOWN_SCAM_ADDRESSES,
            KNOWN_SUSPICIOUS_ADDRESSES,
            KNOWN_UTILITY_ADDRESSES,
        )
    }
}

impl HeuristicReputation {
    pub fn new(scam: &[&str], suspicious: &[&str], utility: &[&str]) -> Self {
        let lower = |list: &[&str]| list.iter().map(|a| a.to_lowercase()).collect();
        Self {
            scam: lower(scam),
            suspicious: lower(suspicious),
            utility: lower(utility),
        }
    }

    pub fn evaluate(&self, address: &str) -> AddressReputation {
        let address = address.trim().to_lowercase();
        let body = address.strip_prefix("0x").unwrap_or(&address);

        if body.is_empty() || body.chars().all(|c| c == '0') {
            return AddressReputation::new(false, 0.0, "Empty or zero address", 0);
        }
        if self.scam.contains(&address) {
            return AddressReputation::new(true, 0.9, "Address is on the known scam list", 9);
        }
        if self.suspicious.contains(&address) {
            return AddressReputation::new(
                false,
                0.6,
                "Address is on the known suspicious list",
                6,
            );
        }
        if self.utility.contains(&address) {
            return AddressReputation::new(false, 0.1, "Known protocol or token contract", 1);
        }
        if let Some(c) = repeated_run(body, REPEATED_CHAR_RUN) {
            return AddressReputation::new(
                false,
                0.5,
                format!("Vanity address with a run of repeated '{}' characters", c),
                5,
            );
        }
        if let Some(pattern) = LEET_PATTERNS.iter().find(|p| body.contains(*p)) {
            return AddressReputation::new(
                false,
                0.4,
                format!("Address contains suspicious pattern '{}'", pattern),
                4,
            );
        }

        AddressReputation::unknown()
    }
}

impl ReputationOracle for HeuristicReputation {
    fn check_address(&self, address: &str) -> AppResult<AddressReputation> {
        Ok(self.evaluate(address))
    }
}

/// First character repeated at least `min_run` times in a row
fn repeated_run(s: &str, min_run: usize) -> Option<char> {
    let mut prev = None;
    let mut run = 0;
    for c in s.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run >= min_run {
            return Some(c);
        }
    }
    None
}

lazy_static::lazy_static! {
    static ref DEFAULT_REPUTATION: HeuristicReputation = HeuristicReputation::default();
}

/// Check an address against the built-in lists
pub fn check_address(address: &str) -> AddressReputation {
    DEFAULT_REPUTATION.evaluate(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_empty() {
        let r = check_address("0x0000000000000000000000000000000000000000");
        assert!(!r.is_scam);
        assert_eq!(r.confidence, 0.0);
        assert_eq!(check_address("").risk_level, 0);
    }

    #[test]
    fn test_known_scam_is_case_insensitive() {
        let r = check_address("0x098B716B8Aaf21512996dC57EB0615e2383E2f96");
        assert!(r.is_scam);
        assert_eq!(r.confidence, 0.9);
        assert_eq!(r.risk_level, 9);
    }

    #[test]
    fn test_suspicious_and_utility() {
        let r = check_address(KNOWN_SUSPICIOUS_ADDRESSES[0]);
        assert!(!r.is_scam);
        assert_eq!(r.risk_level, 6);

        let r = check_address("0xdAC17F958D2ee523a2206206994597C13D831ec7");
        assert_eq!(r.risk_level, 1);
        assert_eq!(r.confidence, 0.1);
    }

    #[test]
    fn test_repeated_characters() {
        let r = check_address("0x1234aaaaaa567890123456789012345678901234");
        assert_eq!(r.risk_level, 5);
        assert_eq!(r.confidence, 0.5);
    }

    #[test]
    fn test_repeated_run_beats_leet() {
        let r = check_address("0xdead111111000000000000000000000000000001");
        assert_eq!(r.risk_level, 5);
    }

    #[test]
    fn test_leet_pattern() {
        let r = check_address("0x12345678901234567890123456789012345dead1");
        assert_eq!(r.risk_level, 4);
        assert!(r.reason.contains("dead"));
    }

    #[test]
    fn test_default_bucket() {
        let r = check_address("0x1234567890123456789012345678901234567890");
        assert_eq!(r, AddressReputation::unknown());
    }

    #[test]
    fn test_custom_lists() {
        let oracle = HeuristicReputation::new(
            &["0x1234567890123456789012345678901234567890"],
            &[],
            &[],
        );
        assert!(oracle
            .check_address("0x1234567890123456789012345678901234567890")
            .unwrap()
            .is_scam);
    }
}
