//! Dashboard-facing assessment contract
//!
//! The field names and value sets here are a stable external interface; the
//! internal `SecurityRiskLevel` naming is mapped onto `ThreatLevel`.

use serde::{Deserialize, Serialize};

use crate::models::types::SecurityRiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatLevel {
    Safe,
    Suspicious,
    High,
    Critical,
}

impl From<SecurityRiskLevel> for ThreatLevel {
    fn from(level: SecurityRiskLevel) -> Self {
        match level {
            SecurityRiskLevel::Low => Self::Safe,
            SecurityRiskLevel::Medium => Self::Suspicious,
            SecurityRiskLevel::High => Self::High,
            SecurityRiskLevel::Critical => Self::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assessment {
    Safe,
    Suspicious,
    Dangerous,
}

impl From<SecurityRiskLevel> for Assessment {
    fn from(level: SecurityRiskLevel) -> Self {
        match level {
            SecurityRiskLevel::Low => Self::Safe,
            SecurityRiskLevel::Medium => Self::Suspicious,
            SecurityRiskLevel::High | SecurityRiskLevel::Critical => Self::Dangerous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureMatch {
    pub pattern: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    /// 0 - 10
    pub severity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarTransaction {
    pub tx_hash: String,
    pub similarity_score: f64,
    pub is_scam: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScamDetails {
    pub address: String,
    pub reason: String,
    pub confidence: f64,
    pub risk_level: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessedTransactionDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scam_details: Option<ScamDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmAnalysis {
    pub assessment: Assessment,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDetails {
    /// Risk score / 100
    pub ml_score: f64,
    pub signature_matches: Vec<SignatureMatch>,
    pub similar_transactions: Vec<SimilarTransaction>,
    pub transaction_type: String,
    pub transaction_details: AssessedTransactionDetails,
    pub llm_analysis: LlmAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatAssessment {
    pub threat_level: ThreatLevel,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub mitigation_suggestions: Vec<String>,
    pub details: AssessmentDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threat_level_mapping() {
        assert_eq!(ThreatLevel::from(SecurityRiskLevel::Low), ThreatLevel::Safe);
        assert_eq!(
            ThreatLevel::from(SecurityRiskLevel::Medium),
            ThreatLevel::Suspicious
        );
        assert_eq!(ThreatLevel::from(SecurityRiskLevel::High), ThreatLevel::High);
        assert_eq!(
            ThreatLevel::from(SecurityRiskLevel::Critical),
            ThreatLevel::Critical
        );
    }

    #[test]
    fn test_threat_level_wire_names() {
        let json = serde_json::to_string(&ThreatLevel::Suspicious).unwrap();
        assert_eq!(json, "\"SUSPICIOUS\"");
        let json = serde_json::to_string(&Assessment::Dangerous).unwrap();
        assert_eq!(json, "\"DANGEROUS\"");
    }
}
