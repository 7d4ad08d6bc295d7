//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so logs and API responses stay
//! greppable.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - INTENT_xxx: malformed transaction input
//! - ORACLE_xxx: risk-factor collection
//! - API_xxx: API errors
//! - CFG_xxx: Configuration errors
//!
//! The analysis core itself never returns these: classification, scoring and
//! recommendations degrade gracefully instead.

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Intent Errors
    // ============================================
    /// Address field is not a 20-byte hex address
    IntentInvalidAddress,
    /// Call data is not valid hex
    IntentInvalidData,
    /// Value is not a decimal/hex integer
    IntentInvalidValue,

    // ============================================
    // Oracle Errors
    // ============================================
    /// Oracle did not answer within its budget
    OracleTimeout,
    /// Transport-level failure talking to the node/explorer
    OracleConnectionFailed,
    /// Node returned a JSON-RPC error object
    OracleRpcError,
    /// Response could not be interpreted
    OracleInvalidResponse,
    /// Oracle not configured for this chain
    OracleUnavailable,

    // ============================================
    // API Errors
    // ============================================
    ApiBadRequest,
    ApiRateLimited,
    ApiInternalError,

    // ============================================
    // Configuration Errors
    // ============================================
    ConfigInvalidValue,

    // ============================================
    // Generic Errors
    // ============================================
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntentInvalidAddress => "INTENT_INVALID_ADDRESS",
            Self::IntentInvalidData => "INTENT_INVALID_DATA",
            Self::IntentInvalidValue => "INTENT_INVALID_VALUE",

            Self::OracleTimeout => "ORACLE_TIMEOUT",
            Self::OracleConnectionFailed => "ORACLE_CONNECTION_FAILED",
            Self::OracleRpcError => "ORACLE_RPC_ERROR",
            Self::OracleInvalidResponse => "ORACLE_INVALID_RESPONSE",
            Self::OracleUnavailable => "ORACLE_UNAVAILABLE",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest
            | Self::IntentInvalidAddress
            | Self::IntentInvalidData
            | Self::IntentInvalidValue
            | Self::ConfigInvalidValue => 400,
            Self::ApiRateLimited => 429,
            Self::OracleTimeout => 504,
            Self::OracleConnectionFailed | Self::OracleRpcError | Self::OracleUnavailable => 502,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OracleTimeout | Self::OracleConnectionFailed | Self::ApiRateLimited
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::IntentInvalidAddress, msg)
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::IntentInvalidData, msg)
    }

    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::IntentInvalidValue, msg)
    }

    pub fn oracle_timeout(oracle: &str, millis: u128) -> Self {
        Self::new(
            ErrorCode::OracleTimeout,
            format!("Oracle '{}' timed out after {}ms", oracle, millis),
        )
    }

    pub fn rpc_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::OracleRpcError, msg)
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::OracleInvalidResponse, msg)
    }

    pub fn oracle_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::OracleUnavailable, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::OracleTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::OracleConnectionFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::OracleInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::oracle_timeout("rpc", 3000);
        assert_eq!(err.code, ErrorCode::OracleTimeout);
        assert_eq!(err.code_str(), "ORACLE_TIMEOUT");
        assert!(err.to_string().contains("3000ms"));
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::OracleTimeout.is_retryable());
        assert!(ErrorCode::OracleConnectionFailed.is_retryable());
        assert!(!ErrorCode::IntentInvalidData.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::IntentInvalidData.http_status(), 400);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::OracleTimeout.http_status(), 504);
        assert_eq!(ErrorCode::ApiInternalError.http_status(), 500);
    }
}
