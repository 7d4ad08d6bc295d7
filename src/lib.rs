//! TX Sentinel Library
//!
//! Deterministic pre-signing risk analysis for EVM transaction intents:
//! - Classification of call data against known selectors and protocols
//! - Address reputation heuristics
//! - Five-category weighted risk scoring with safe factor defaults
//! - Per-type recommendations, including corrected approval call data
//!
//! Risk factors the caller does not supply can be collected from pluggable
//! oracles (static registry, JSON-RPC node) under a timeout.

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::analyzer::{RatedAddress, TransactionAnalyzer, TransactionReport};
pub use crate::core::classifier::TransactionClassifier;
pub use crate::core::recommendations::RecommendationEngine;
pub use crate::core::reputation::{check_address, HeuristicReputation, ReputationOracle};
pub use crate::core::risk_factors::{
    ContractAge, FactorCollector, PartialRiskFactors, RiskFactorOracle, RiskFactors,
};
pub use crate::core::risk_score::{RiskBreakdown, RiskScoreResult, RiskScorer};
pub use crate::models::assessment::{ThreatAssessment, ThreatLevel};
pub use crate::models::config::{EngineConfig, OracleConfig, ScoringConfig};
pub use crate::models::errors::{AppError, AppResult, ErrorCode};
pub use crate::models::types::{
    AddressReputation, RawTransaction, Recommendation, SecurityRiskLevel, TransactionAnalysis,
    TransactionIntent, TransactionType,
};
pub use crate::providers::build_collector;
