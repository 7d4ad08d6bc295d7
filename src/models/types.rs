//! Type definitions for the transaction risk engine
//! All core data structures flowing through classification, scoring and recommendations

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::errors::{AppError, AppResult};

// ============================================
// INPUT
// ============================================

/// Transaction intent exactly as the dashboard submits it (all strings)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    /// Destination address, absent for contract deployments
    #[serde(default)]
    pub to: Option<String>,
    /// 0x-prefixed call data
    #[serde(default)]
    pub data: String,
    /// Value in wei, decimal (hex with 0x prefix also accepted)
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub from: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

fn default_chain_id() -> u64 {
    1
}

/// Parsed, immutable transaction intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIntent {
    pub to: Option<Address>,
    pub data: Bytes,
    pub value: U256,
    pub from: Address,
    pub chain_id: u64,
}

impl TransactionIntent {
    pub fn new(to: Option<Address>, data: Bytes, value: U256, from: Address, chain_id: u64) -> Self {
        Self {
            to,
            data,
            value,
            from,
            chain_id,
        }
    }

    /// Intent carrying nothing but its chain, used when the raw input is malformed
    pub fn empty(chain_id: u64) -> Self {
        Self::new(None, Bytes::new(), U256::ZERO, Address::ZERO, chain_id)
    }

    /// Parse the dashboard representation
    pub fn parse(raw: &RawTransaction) -> AppResult<Self> {
        let to = match raw.to.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(parse_address(s, "destination")?),
        };

        let from = match raw.from.trim() {
            "" => Address::ZERO,
            s => parse_address(s, "sender")?,
        };

        Ok(Self {
            to,
            data: parse_hex_data(&raw.data)?,
            value: parse_value(&raw.value)?,
            from,
            chain_id: raw.chain_id,
        })
    }

    /// First four bytes of the call data
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|s| s.try_into().ok())
    }

    #[inline]
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}

fn parse_address(s: &str, which: &str) -> AppResult<Address> {
    Address::from_str(s)
        .map_err(|e| AppError::invalid_address(format!("Invalid {} address '{}': {}", which, s, e)))
}

/// Decode `0x`-prefixed (or bare) hex call data; `""` and `"0x"` are empty
pub fn parse_hex_data(s: &str) -> AppResult<Bytes> {
    let s = s.trim();
    let body = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if body.is_empty() {
        return Ok(Bytes::new());
    }
    hex::decode(body)
        .map(Bytes::from)
        .map_err(|e| AppError::invalid_data(format!("Call data is not valid hex: {}", e)))
}

/// Parse a wei amount, empty means zero
pub fn parse_value(s: &str) -> AppResult<U256> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str(s).map_err(|e| AppError::invalid_value(format!("Invalid value '{}': {}", s, e)))
}

// ============================================
// CLASSIFICATION
// ============================================

/// Closed taxonomy of transaction kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Transfer,
    Approval,
    UnlimitedApproval,
    SwapExactTokensForTokens,
    SwapTokensForExactTokens,
    SwapExactEthForTokens,
    SwapTokensForExactEth,
    SwapExactTokensForEth,
    SwapEthForExactTokens,
    NftTransfer,
    NftApproval,
    AddLiquidity,
    RemoveLiquidity,
    Lending,
    Borrowing,
    ContractDeployment,
    Unknown,
}

impl TransactionType {
    pub const SWAPS: [TransactionType; 6] = [
        TransactionType::SwapExactTokensForTokens,
        TransactionType::SwapTokensForExactTokens,
        TransactionType::SwapExactEthForTokens,
        TransactionType::SwapTokensForExactEth,
        TransactionType::SwapExactTokensForEth,
        TransactionType::SwapEthForExactTokens,
    ];

    pub const ALL: [TransactionType; 17] = [
        TransactionType::Transfer,
        TransactionType::Approval,
        TransactionType::UnlimitedApproval,
        TransactionType::SwapExactTokensForTokens,
        TransactionType::SwapTokensForExactTokens,
        TransactionType::SwapExactEthForTokens,
        TransactionType::SwapTokensForExactEth,
        TransactionType::SwapExactTokensForEth,
        TransactionType::SwapEthForExactTokens,
        TransactionType::NftTransfer,
        TransactionType::NftApproval,
        TransactionType::AddLiquidity,
        TransactionType::RemoveLiquidity,
        TransactionType::Lending,
        TransactionType::Borrowing,
        TransactionType::ContractDeployment,
        TransactionType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "TRANSFER",
            Self::Approval => "APPROVAL",
            Self::UnlimitedApproval => "UNLIMITED_APPROVAL",
            Self::SwapExactTokensForTokens => "SWAP_EXACT_TOKENS_FOR_TOKENS",
            Self::SwapTokensForExactTokens => "SWAP_TOKENS_FOR_EXACT_TOKENS",
            Self::SwapExactEthForTokens => "SWAP_EXACT_ETH_FOR_TOKENS",
            Self::SwapTokensForExactEth => "SWAP_TOKENS_FOR_EXACT_ETH",
            Self::SwapExactTokensForEth => "SWAP_EXACT_TOKENS_FOR_ETH",
            Self::SwapEthForExactTokens => "SWAP_ETH_FOR_EXACT_TOKENS",
            Self::NftTransfer => "NFT_TRANSFER",
            Self::NftApproval => "NFT_APPROVAL",
            Self::AddLiquidity => "ADD_LIQUIDITY",
            Self::RemoveLiquidity => "REMOVE_LIQUIDITY",
            Self::Lending => "LENDING",
            Self::Borrowing => "BORROWING",
            Self::ContractDeployment => "CONTRACT_DEPLOYMENT",
            Self::Unknown => "UNKNOWN",
        }
    }

    #[inline]
    pub fn is_swap(&self) -> bool {
        Self::SWAPS.contains(self)
    }

    #[inline]
    pub fn is_approval(&self) -> bool {
        matches!(
            self,
            Self::Approval | Self::UnlimitedApproval | Self::NftApproval
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionComplexity {
    Simple,
    Medium,
    Complex,
}

/// Ordered risk level: Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityRiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl SecurityRiskLevel {
    /// Banding: >=75 Critical, >=50 High, >=25 Medium, else Low
    pub fn from_score(score: u8) -> Self {
        match score {
            75..=u8::MAX => Self::Critical,
            50..=74 => Self::High,
            25..=49 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Low => "✅",
            Self::Medium => "🟡",
            Self::High => "🔴",
            Self::Critical => "💀",
        }
    }
}

/// Type-specific payload of a classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TransactionDetails {
    /// Plain native-currency transfer
    #[serde(rename_all = "camelCase")]
    NativeTransfer { eth_value: String, symbol: String },
    #[serde(rename_all = "camelCase")]
    TokenTransfer {
        token_address: Address,
        sender: Option<Address>,
        recipient: Address,
        amount: U256,
    },
    #[serde(rename_all = "camelCase")]
    Approval {
        token_address: Address,
        spender_address: Address,
        amount: U256,
        is_unlimited: bool,
    },
    #[serde(rename_all = "camelCase")]
    Swap {
        amount_in: Option<U256>,
        amount_in_max: Option<U256>,
        amount_out: Option<U256>,
        amount_out_min: Option<U256>,
        path: Vec<Address>,
        recipient: Option<Address>,
        eth_value: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    NftTransfer {
        collection: Address,
        sender: Address,
        recipient: Address,
        token_id: U256,
        amount: Option<U256>,
    },
    #[serde(rename_all = "camelCase")]
    NftApproval {
        collection: Address,
        operator: Address,
        approved: bool,
    },
    #[serde(rename_all = "camelCase")]
    Liquidity {
        token_a: Address,
        token_b: Option<Address>,
        liquidity: Option<U256>,
        recipient: Address,
    },
    #[serde(rename_all = "camelCase")]
    Lending {
        asset: Address,
        amount: U256,
        on_behalf_of: Address,
    },
    #[serde(rename_all = "camelCase")]
    Deployment { data_size: usize },
    /// Selector matched but parameters could not be decoded
    #[serde(rename_all = "camelCase")]
    Undecoded { selector: String, data_size: usize },
    #[serde(rename_all = "camelCase")]
    Unknown {
        selector: Option<String>,
        data_size: usize,
    },
    /// Raw input could not be parsed at all
    Malformed { reason: String },
}

/// Classification result, produced once per intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAnalysis {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub complexity: TransactionComplexity,
    pub base_risk_level: SecurityRiskLevel,
    pub description: String,
    /// Human readable function name (e.g. `approve`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    pub details: TransactionDetails,
}

impl TransactionAnalysis {
    /// Degraded result for input that could not be parsed
    pub fn malformed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            tx_type: TransactionType::Unknown,
            complexity: TransactionComplexity::Simple,
            base_risk_level: SecurityRiskLevel::Low,
            description: format!("Malformed transaction input: {}", reason),
            function_name: None,
            protocol: None,
            details: TransactionDetails::Malformed { reason },
        }
    }

    /// Spender / operator of an approval, if decoded
    pub fn spender(&self) -> Option<Address> {
        match &self.details {
            TransactionDetails::Approval {
                spender_address, ..
            } => Some(*spender_address),
            TransactionDetails::NftApproval { operator, .. } => Some(*operator),
            _ => None,
        }
    }

    /// Receiver of a decoded token or NFT transfer
    pub fn recipient(&self) -> Option<Address> {
        match &self.details {
            TransactionDetails::TokenTransfer { recipient, .. }
            | TransactionDetails::NftTransfer { recipient, .. } => Some(*recipient),
            _ => None,
        }
    }

    pub fn is_unlimited_approval(&self) -> bool {
        matches!(
            self.details,
            TransactionDetails::Approval {
                is_unlimited: true,
                ..
            }
        ) || self.tx_type == TransactionType::UnlimitedApproval
    }
}

// ============================================
// REPUTATION
// ============================================

/// Heuristic reputation of a single address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressReputation {
    pub is_scam: bool,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub reason: String,
    /// 0 - 10
    pub risk_level: u8,
}

impl AddressReputation {
    pub fn new(is_scam: bool, confidence: f64, reason: impl Into<String>, risk_level: u8) -> Self {
        Self {
            is_scam,
            confidence,
            reason: reason.into(),
            risk_level,
        }
    }

    /// Default bucket, also used when a lookup fails
    pub fn unknown() -> Self {
        Self::new(false, 0.2, "No known issues", 2)
    }
}

// ============================================
// RECOMMENDATIONS
// ============================================

/// Recommendation priority, ordered critical first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ApprovalSafety,
    SlippageProtection,
    MevProtection,
    AddressVerification,
    ContractVerification,
    LiquidityRisk,
    LendingRisk,
    WalletHygiene,
    RiskAlert,
    RiskFlag,
    Mitigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ModifyApproval,
    RevokeApproval,
    SetSlippage,
    UsePrivateRelay,
    VerifyAddress,
    ReviewContract,
    SimulateTransaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub label: String,
    /// Concrete parameters (replacement call data, slippage settings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub actionable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<RecommendationAction>,
    pub priority: Priority,
    pub applies_to: Vec<TransactionType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(to: Option<&str>, data: &str, value: &str) -> RawTransaction {
        RawTransaction {
            to: to.map(String::from),
            data: data.to_string(),
            value: value.to_string(),
            from: String::new(),
            chain_id: 1,
        }
    }

    #[test]
    fn test_parse_intent() {
        let intent = TransactionIntent::parse(&raw(
            Some("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"),
            "0x095ea7b3",
            "1000",
        ))
        .unwrap();
        assert!(intent.to.is_some());
        assert_eq!(intent.selector(), Some([0x09, 0x5e, 0xa7, 0xb3]));
        assert_eq!(intent.value, U256::from(1000u64));
        assert_eq!(intent.from, Address::ZERO);
    }

    #[test]
    fn test_parse_empty_data_and_value() {
        let intent = TransactionIntent::parse(&raw(None, "0x", "")).unwrap();
        assert!(intent.to.is_none());
        assert!(!intent.has_data());
        assert_eq!(intent.value, U256::ZERO);
        assert_eq!(intent.selector(), None);
    }

    #[test]
    fn test_parse_rejects_non_hex_data() {
        let err = TransactionIntent::parse(&raw(None, "0xzz12", "0")).unwrap_err();
        assert_eq!(err.code_str(), "INTENT_INVALID_DATA");
    }

    #[test]
    fn test_parse_rejects_bad_address() {
        let err = TransactionIntent::parse(&raw(Some("0x1234"), "0x", "0")).unwrap_err();
        assert_eq!(err.code_str(), "INTENT_INVALID_ADDRESS");
    }

    #[test]
    fn test_risk_level_banding() {
        assert_eq!(SecurityRiskLevel::from_score(0), SecurityRiskLevel::Low);
        assert_eq!(SecurityRiskLevel::from_score(24), SecurityRiskLevel::Low);
        assert_eq!(SecurityRiskLevel::from_score(25), SecurityRiskLevel::Medium);
        assert_eq!(SecurityRiskLevel::from_score(50), SecurityRiskLevel::High);
        assert_eq!(SecurityRiskLevel::from_score(75), SecurityRiskLevel::Critical);
        assert_eq!(SecurityRiskLevel::from_score(100), SecurityRiskLevel::Critical);
        assert!(SecurityRiskLevel::Low < SecurityRiskLevel::Critical);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical < Priority::High);
        assert!(Priority::Medium < Priority::Low);
    }
}
