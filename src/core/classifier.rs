//! Transaction classifier
//!
//! Maps a parsed intent onto the closed `TransactionType` taxonomy using the
//! static selector table. Classification never fails: anything that cannot
//! be decoded degrades to a conservative result.

use alloy_primitives::Address;
use tracing::debug;

use crate::models::types::{
    SecurityRiskLevel, TransactionAnalysis, TransactionComplexity, TransactionDetails,
    TransactionIntent, TransactionType,
};
use crate::utils::constants::{
    format_native, get_native_symbol, get_protocol_name, COMPLEX_PAYLOAD_BYTES,
    MEDIUM_PAYLOAD_BYTES,
};
use crate::utils::decoder::{lookup_selector, selector_hex, KnownSelector};

pub const UNKNOWN_PROTOCOL: &str = "Unknown";

pub struct TransactionClassifier;

impl TransactionClassifier {
    pub fn classify(intent: &TransactionIntent) -> TransactionAnalysis {
        let analysis = if !intent.has_data() {
            Self::classify_plain(intent)
        } else if intent.to.is_none() {
            let data_size = intent.data.len();
            TransactionAnalysis {
                tx_type: TransactionType::ContractDeployment,
                complexity: TransactionComplexity::Complex,
                base_risk_level: SecurityRiskLevel::High,
                description: format!("Contract deployment ({} bytes of init code)", data_size),
                function_name: None,
                protocol: None,
                details: TransactionDetails::Deployment { data_size },
            }
        } else {
            match intent.selector().and_then(lookup_selector) {
                Some(known) => Self::classify_known(intent, known),
                None => Self::classify_unknown(intent),
            }
        };

        debug!(
            "🏷️ Classified as {} ({:?}, base risk {})",
            analysis.tx_type,
            analysis.complexity,
            analysis.base_risk_level.as_str()
        );
        analysis
    }

    /// Protocol name of a known contract, "Unknown" otherwise
    pub fn detect_protocol(address: &Address) -> &'static str {
        get_protocol_name(address).unwrap_or(UNKNOWN_PROTOCOL)
    }

    fn classify_plain(intent: &TransactionIntent) -> TransactionAnalysis {
        if intent.value.is_zero() {
            return TransactionAnalysis {
                tx_type: TransactionType::Unknown,
                complexity: TransactionComplexity::Simple,
                base_risk_level: SecurityRiskLevel::Low,
                description: "Empty transaction carrying no value or data".to_string(),
                function_name: None,
                protocol: None,
                details: TransactionDetails::Unknown {
                    selector: None,
                    data_size: 0,
                },
            };
        }

        let symbol = get_native_symbol(intent.chain_id);
        let eth_value = format_native(intent.value);
        TransactionAnalysis {
            tx_type: TransactionType::Transfer,
            complexity: TransactionComplexity::Simple,
            base_risk_level: SecurityRiskLevel::Low,
            description: format!("Transfer of {} {}", eth_value, symbol),
            function_name: None,
            protocol: None,
            details: TransactionDetails::NativeTransfer {
                eth_value,
                symbol: symbol.to_string(),
            },
        }
    }

    fn classify_known(intent: &TransactionIntent, known: &KnownSelector) -> TransactionAnalysis {
        let protocol = intent
            .to
            .as_ref()
            .and_then(get_protocol_name)
            .map(String::from);
        let via = protocol
            .as_deref()
            .map(|p| format!(" via {}", p))
            .unwrap_or_default();

        let details = match known.decode(intent) {
            Ok(details) => details,
            Err(e) => {
                debug!("⚠️ Could not decode {} parameters: {}", known.name, e);
                return TransactionAnalysis {
                    tx_type: known.tx_type,
                    complexity: known.complexity,
                    base_risk_level: known.fallback_risk,
                    description: format!("{}{} (unable to decode parameters)", known.label, via),
                    function_name: Some(known.name.to_string()),
                    protocol,
                    details: TransactionDetails::Undecoded {
                        selector: selector_hex(known.selector),
                        data_size: intent.data.len(),
                    },
                };
            }
        };

        let (tx_type, base_risk_level, description) = match &details {
            TransactionDetails::Approval {
                spender_address,
                amount,
                is_unlimited: true,
                ..
            } => (
                TransactionType::UnlimitedApproval,
                SecurityRiskLevel::High,
                format!(
                    "Unlimited token approval ({}) granting {} control of all tokens",
                    amount, spender_address
                ),
            ),
            TransactionDetails::Approval {
                spender_address,
                amount,
                ..
            } => (
                known.tx_type,
                known.base_risk,
                format!("Token approval of {} to {}", amount, spender_address),
            ),
            TransactionDetails::NftApproval {
                operator,
                approved: false,
                ..
            } => (
                known.tx_type,
                SecurityRiskLevel::Low,
                format!("Revoke collection-wide NFT approval for {}", operator),
            ),
            TransactionDetails::NftApproval { operator, .. } => (
                known.tx_type,
                known.base_risk,
                format!("{} for operator {}", known.label, operator),
            ),
            TransactionDetails::TokenTransfer {
                recipient, amount, ..
            } => (
                known.tx_type,
                known.base_risk,
                format!("{} of {} to {}", known.label, amount, recipient),
            ),
            _ => (known.tx_type, known.base_risk, format!("{}{}", known.label, via)),
        };

        TransactionAnalysis {
            tx_type,
            complexity: known.complexity,
            base_risk_level,
            description,
            function_name: Some(known.name.to_string()),
            protocol,
            details,
        }
    }

    fn classify_unknown(intent: &TransactionIntent) -> TransactionAnalysis {
        let data_size = intent.data.len();
        let (complexity, base_risk_level) = if data_size > COMPLEX_PAYLOAD_BYTES {
            (TransactionComplexity::Complex, SecurityRiskLevel::High)
        } else if data_size > MEDIUM_PAYLOAD_BYTES {
            (TransactionComplexity::Medium, SecurityRiskLevel::Medium)
        } else {
            (TransactionComplexity::Simple, SecurityRiskLevel::Low)
        };

        let selector = intent.selector().map(selector_hex);
        let description = match &selector {
            Some(s) => format!("Unknown contract interaction (selector {}, {} bytes)", s, data_size),
            None => format!("Call data too short to carry a selector ({} bytes)", data_size),
        };

        TransactionAnalysis {
            tx_type: TransactionType::Unknown,
            complexity,
            base_risk_level,
            description,
            function_name: None,
            protocol: intent.to.as_ref().and_then(get_protocol_name).map(String::from),
            details: TransactionDetails::Unknown {
                selector,
                data_size,
            },
        }
    }
}
