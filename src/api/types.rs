//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::core::analyzer::TransactionReport;
use crate::core::risk_factors::PartialRiskFactors;
use crate::models::assessment::ThreatAssessment;
use crate::models::errors::AppError;
use crate::models::types::{AddressReputation, RawTransaction};

/// Largest batch accepted by `/v1/analyze/batch`
pub const MAX_BATCH_SIZE: usize = 100;

/// Upper bound for the per-batch concurrency knob
pub const MAX_BATCH_CONCURRENCY: usize = 50;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: "RATE_LIMITED".to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

// ============================================
// Transaction Analysis
// ============================================

/// One transaction intent plus any risk factors the caller already knows
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeTransactionRequest {
    #[serde(flatten)]
    pub transaction: RawTransaction,
    #[serde(default)]
    pub risk_factors: PartialRiskFactors,
    /// Attach the full internal report next to the assessment
    #[serde(default)]
    pub include_report: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeTransactionData {
    pub analysis_id: String,
    pub assessment: ThreatAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<TransactionReport>,
}

// ============================================
// Batch Analysis
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAnalysisRequest {
    pub transactions: Vec<AnalyzeTransactionRequest>,
    /// Max concurrent analyses (default: 10, max: 50)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    10
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAnalysisData {
    pub total_requested: usize,
    pub total_processed: usize,
    pub total_safe: usize,
    pub total_suspicious: usize,
    pub total_dangerous: usize,
    pub results: Vec<BatchTransactionResult>,
    pub processing_time_ms: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTransactionResult {
    /// Position in the request array
    pub index: usize,
    pub status: String, // "success" | "error"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<ThreatAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: f64,
}

// ============================================
// Address Check
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressCheckRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressCheckData {
    /// Checksummed form of the submitted address
    pub address: String,
    pub reputation: AddressReputation,
    /// Known protocol at this address, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

// ============================================
// Stats
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    pub total_analyzed: u64,
    pub total_low: u64,
    pub total_medium: u64,
    pub total_high: u64,
    pub total_critical: u64,
    pub avg_latency_ms: f64,
    pub factor_oracles: Vec<String>,
    pub uptime_seconds: u64,
    pub api_version: String,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_request_flattens_transaction() {
        let req: AnalyzeTransactionRequest = serde_json::from_value(serde_json::json!({
            "to": "0xdAC17F958D2ee523a2206206994597C13D831ec7",
            "data": "0x",
            "value": "0",
            "from": "0x1234567890123456789012345678901234567890",
            "chainId": 1,
            "riskFactors": { "isVerified": false },
            "includeReport": true
        }))
        .unwrap();

        assert_eq!(
            req.transaction.to.as_deref(),
            Some("0xdAC17F958D2ee523a2206206994597C13D831ec7")
        );
        assert_eq!(req.risk_factors.is_verified, Some(false));
        assert!(req.include_report);
    }

    #[test]
    fn test_batch_defaults() {
        let req: BatchAnalysisRequest =
            serde_json::from_value(serde_json::json!({ "transactions": [{ "value": "1" }] }))
                .unwrap();
        assert_eq!(req.concurrency, 10);
        assert_eq!(req.transactions[0].transaction.chain_id, 1);
        assert!(req.transactions[0].risk_factors.is_empty());
    }

    #[test]
    fn test_api_error_from_app_error() {
        let err = ApiError::from(&AppError::invalid_address("bad"));
        assert_eq!(err.code, "INTENT_INVALID_ADDRESS");
        assert_eq!(err.message, "bad");
    }
}
