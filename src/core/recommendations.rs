//! Recommendation engine
//!
//! Filters the static catalog by transaction type (through a prebuilt
//! index), augments it from the score's textual trail, attaches concrete
//! parameters where the call can be rebuilt, de-duplicates and sorts.

use alloy_primitives::U256;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::core::risk_score::{
    RiskScoreResult, FLAG_HIGH_SLIPPAGE, FLAG_MEV_VULNERABLE, FLAG_UNLIMITED_APPROVAL,
};
use crate::models::types::{
    ActionKind, Priority, Recommendation, RecommendationAction, RecommendationKind,
    SecurityRiskLevel, TransactionAnalysis, TransactionDetails, TransactionIntent,
    TransactionType,
};
use crate::utils::constants::{SUGGESTED_APPROVAL_WEI, SUGGESTED_SLIPPAGE_BPS};
use crate::utils::decoder::{decode_approve, encode_approve};

pub const LIMIT_APPROVAL_TITLE: &str = "Limit Token Approval Amount";
pub const SET_SLIPPAGE_TITLE: &str = "Set Maximum Slippage";
pub const MEV_PROTECTION_TITLE: &str = "Use MEV Protection";
pub const HIGH_RISK_ALERT_TITLE: &str = "High Risk Transaction Alert";

/// Static catalog row
struct CatalogEntry {
    kind: RecommendationKind,
    title: &'static str,
    description: &'static str,
    action: Option<(ActionKind, &'static str)>,
    priority: Priority,
    applies_to: &'static [TransactionType],
}

impl CatalogEntry {
    fn to_recommendation(&self) -> Recommendation {
        Recommendation {
            kind: self.kind,
            title: self.title.to_string(),
            description: self.description.to_string(),
            actionable: self.action.is_some(),
            action: self.action.map(|(kind, label)| RecommendationAction {
                kind,
                label: label.to_string(),
                data: None,
            }),
            priority: self.priority,
            applies_to: self.applies_to.to_vec(),
        }
    }
}

use TransactionType as T;

const APPROVALS: &[TransactionType] = &[T::Approval, T::UnlimitedApproval];
const SWAPS: &[TransactionType] = &T::SWAPS;
const SWAPS_AND_LIQUIDITY: &[TransactionType] = &[
    T::SwapExactTokensForTokens,
    T::SwapTokensForExactTokens,
    T::SwapExactEthForTokens,
    T::SwapTokensForExactEth,
    T::SwapExactTokensForEth,
    T::SwapEthForExactTokens,
    T::AddLiquidity,
    T::RemoveLiquidity,
];
const TRANSFERS: &[TransactionType] = &[T::Transfer, T::NftTransfer];
const LENDING: &[TransactionType] = &[T::Lending, T::Borrowing];
const UNKNOWN_AND_DEPLOYMENT: &[TransactionType] = &[T::Unknown, T::ContractDeployment];

static CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        kind: RecommendationKind::ApprovalSafety,
        title: LIMIT_APPROVAL_TITLE,
        description: "Approve only the amount this transaction needs instead of an unlimited allowance.",
        action: Some((ActionKind::ModifyApproval, "Use a bounded approval")),
        priority: Priority::High,
        applies_to: APPROVALS,
    },
    CatalogEntry {
        kind: RecommendationKind::WalletHygiene,
        title: "Revoke Unused Approvals",
        description: "Review and revoke token allowances you no longer need.",
        action: Some((ActionKind::RevokeApproval, "Review allowances")),
        priority: Priority::Medium,
        applies_to: &[T::Approval, T::UnlimitedApproval, T::NftApproval],
    },
    CatalogEntry {
        kind: RecommendationKind::AddressVerification,
        title: "Verify Spender Contract",
        description: "Make sure the spender is the official contract of the application you are using.",
        action: Some((ActionKind::VerifyAddress, "Verify spender")),
        priority: Priority::High,
        applies_to: &[T::Approval, T::UnlimitedApproval, T::NftApproval],
    },
    CatalogEntry {
        kind: RecommendationKind::SlippageProtection,
        title: SET_SLIPPAGE_TITLE,
        description: "Set a minimum output so the swap reverts instead of filling at a bad price.",
        action: Some((ActionKind::SetSlippage, "Set slippage to 1%")),
        priority: Priority::High,
        applies_to: SWAPS,
    },
    CatalogEntry {
        kind: RecommendationKind::MevProtection,
        title: MEV_PROTECTION_TITLE,
        description: "Submit through a private relay so the swap cannot be front-run or sandwiched.",
        action: Some((ActionKind::UsePrivateRelay, "Use private relay")),
        priority: Priority::Medium,
        applies_to: SWAPS,
    },
    CatalogEntry {
        kind: RecommendationKind::ContractVerification,
        title: "Verify Token Contract",
        description: "Confirm every token in the path is the genuine contract and not a look-alike.",
        action: Some((ActionKind::ReviewContract, "Check token on explorer")),
        priority: Priority::Medium,
        applies_to: SWAPS_AND_LIQUIDITY,
    },
    CatalogEntry {
        kind: RecommendationKind::AddressVerification,
        title: "Double-Check Recipient Address",
        description: "Compare the full recipient address, not just the first and last characters.",
        action: Some((ActionKind::VerifyAddress, "Verify recipient")),
        priority: Priority::High,
        applies_to: TRANSFERS,
    },
    CatalogEntry {
        kind: RecommendationKind::WalletHygiene,
        title: "Send a Test Transaction",
        description: "For large amounts, send a small amount first and confirm it arrives.",
        action: None,
        priority: Priority::Low,
        applies_to: TRANSFERS,
    },
    CatalogEntry {
        kind: RecommendationKind::ApprovalSafety,
        title: "Beware of Collection-Wide Approvals",
        description: "setApprovalForAll lets the operator move every NFT you own in this collection.",
        action: Some((ActionKind::VerifyAddress, "Verify operator")),
        priority: Priority::High,
        applies_to: &[T::NftApproval],
    },
    CatalogEntry {
        kind: RecommendationKind::LiquidityRisk,
        title: "Understand Impermanent Loss",
        description: "Providing liquidity exposes you to impermanent loss when prices diverge.",
        action: None,
        priority: Priority::Low,
        applies_to: &[T::AddLiquidity],
    },
    CatalogEntry {
        kind: RecommendationKind::LiquidityRisk,
        title: "Check Pool Reserves",
        description: "Thin pools move sharply; check reserves and the minimum amounts you accept.",
        action: None,
        priority: Priority::Medium,
        applies_to: &[T::AddLiquidity, T::RemoveLiquidity],
    },
    CatalogEntry {
        kind: RecommendationKind::LendingRisk,
        title: "Monitor Health Factor",
        description: "Borrowed positions can be liquidated; keep a safe collateral buffer.",
        action: None,
        priority: Priority::Medium,
        applies_to: LENDING,
    },
    CatalogEntry {
        kind: RecommendationKind::ContractVerification,
        title: "Review Deployment Bytecode",
        description: "Only deploy bytecode you compiled yourself or obtained from a trusted source.",
        action: Some((ActionKind::ReviewContract, "Review bytecode")),
        priority: Priority::High,
        applies_to: &[T::ContractDeployment],
    },
    CatalogEntry {
        kind: RecommendationKind::ContractVerification,
        title: "Simulate Before Signing",
        description: "The call could not be fully decoded; simulate it to see the resulting state changes.",
        action: Some((ActionKind::SimulateTransaction, "Simulate transaction")),
        priority: Priority::High,
        applies_to: UNKNOWN_AND_DEPLOYMENT,
    },
    CatalogEntry {
        kind: RecommendationKind::WalletHygiene,
        title: "Use a Hardware Wallet",
        description: "Keep significant funds on a hardware wallet and confirm details on its screen.",
        action: None,
        priority: Priority::Low,
        applies_to: &[T::Borrowing, T::UnlimitedApproval, T::NftApproval],
    },
];

/// Risk flags already answered by a dedicated catalog entry
const FLAG_COVERAGE: &[(&str, &str)] = &[
    (FLAG_UNLIMITED_APPROVAL, LIMIT_APPROVAL_TITLE),
    (FLAG_HIGH_SLIPPAGE, SET_SLIPPAGE_TITLE),
    (FLAG_MEV_VULNERABLE, MEV_PROTECTION_TITLE),
];

lazy_static::lazy_static! {
    /// TransactionType -> catalog indices, in catalog order
    static ref CATALOG_INDEX: HashMap<TransactionType, Vec<usize>> = {
        let mut index: HashMap<TransactionType, Vec<usize>> = HashMap::new();
        for (i, entry) in CATALOG.iter().enumerate() {
            for tx_type in entry.applies_to {
                index.entry(*tx_type).or_default().push(i);
            }
        }
        index
    };
}

/// Fresh copies of the catalog entries for a type
pub fn catalog_for(tx_type: TransactionType) -> Vec<Recommendation> {
    CATALOG_INDEX
        .get(&tx_type)
        .map(|ids| ids.iter().map(|&i| CATALOG[i].to_recommendation()).collect())
        .unwrap_or_default()
}

pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn recommend(
        intent: &TransactionIntent,
        analysis: &TransactionAnalysis,
        risk: Option<&RiskScoreResult>,
    ) -> Vec<Recommendation> {
        let tx_type = analysis.tx_type;
        let mut recs = catalog_for(tx_type);

        if let Some(risk) = risk.filter(|r| r.level >= SecurityRiskLevel::High) {
            Self::augment(&mut recs, tx_type, risk);
        }

        Self::enrich(&mut recs, intent, analysis);

        let mut seen = HashSet::new();
        recs.retain(|r| seen.insert(r.title.clone()));
        recs.sort_by_key(|r| r.priority);

        debug!("💡 {} recommendation(s) for {}", recs.len(), tx_type);
        recs
    }

    fn augment(recs: &mut Vec<Recommendation>, tx_type: TransactionType, risk: &RiskScoreResult) {
        recs.push(Recommendation {
            kind: RecommendationKind::RiskAlert,
            title: HIGH_RISK_ALERT_TITLE.to_string(),
            description: format!(
                "Risk score {}/100 ({}). Review every detail before signing.",
                risk.score,
                risk.level.as_str()
            ),
            actionable: false,
            action: None,
            priority: Priority::Critical,
            applies_to: vec![tx_type],
        });

        let mut seen_flags = HashSet::new();
        for flag in &risk.breakdown.risk_flags {
            if !seen_flags.insert(flag.as_str()) || is_flag_covered(flag, recs) {
                continue;
            }
            recs.push(Recommendation {
                kind: RecommendationKind::RiskFlag,
                title: format!("Risk: {}", flag),
                description: flag.clone(),
                actionable: false,
                action: None,
                priority: Priority::High,
                applies_to: vec![tx_type],
            });
        }

        for mitigation in &risk.breakdown.suggested_mitigations {
            if is_mentioned(mitigation, recs) {
                continue;
            }
            recs.push(Recommendation {
                kind: RecommendationKind::Mitigation,
                title: mitigation.clone(),
                description: "Suggested by the risk analysis for this transaction.".to_string(),
                actionable: false,
                action: None,
                priority: Priority::Medium,
                applies_to: vec![tx_type],
            });
        }
    }

    /// Best-effort: a failure leaves `action.data` unset
    fn enrich(recs: &mut [Recommendation], intent: &TransactionIntent, analysis: &TransactionAnalysis) {
        if analysis.tx_type == TransactionType::UnlimitedApproval {
            let Some(action) = action_mut(recs, LIMIT_APPROVAL_TITLE) else {
                return;
            };
            match decode_approve(&intent.data) {
                Ok((spender, _)) => {
                    let data = encode_approve(spender, U256::from(SUGGESTED_APPROVAL_WEI));
                    action.data = Some(format!("0x{}", hex::encode(data)));
                }
                Err(e) => debug!("⚠️ Could not rebuild bounded approval: {}", e),
            }
        } else if analysis.tx_type.is_swap() {
            if !matches!(analysis.details, TransactionDetails::Swap { .. }) {
                return;
            }
            if let Some(action) = action_mut(recs, SET_SLIPPAGE_TITLE) {
                let params = serde_json::json!({
                    "slippageBps": SUGGESTED_SLIPPAGE_BPS,
                    "slippagePercent": SUGGESTED_SLIPPAGE_BPS as f64 / 100.0,
                });
                action.data = Some(params.to_string());
            }
        }
    }
}

fn action_mut<'a>(recs: &'a mut [Recommendation], title: &str) -> Option<&'a mut RecommendationAction> {
    recs.iter_mut()
        .find(|r| r.title == title)
        .and_then(|r| r.action.as_mut())
}

fn is_flag_covered(flag: &str, recs: &[Recommendation]) -> bool {
    let covered_by_catalog = FLAG_COVERAGE
        .iter()
        .any(|(f, title)| *f == flag && recs.iter().any(|r| r.title == *title));
    covered_by_catalog || is_mentioned(flag, recs)
}

/// Case-insensitive substring check against existing titles and descriptions
fn is_mentioned(text: &str, recs: &[Recommendation]) -> bool {
    let needle = text.to_lowercase();
    recs.iter().any(|r| {
        r.title.to_lowercase().contains(&needle) || r.description.to_lowercase().contains(&needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::risk_factors::PartialRiskFactors;
    use crate::core::risk_score::RiskScorer;
    use alloy_primitives::{Address, Bytes};

    fn analysis(tx_type: TransactionType, details: TransactionDetails) -> TransactionAnalysis {
        TransactionAnalysis {
            tx_type,
            complexity: crate::models::types::TransactionComplexity::Simple,
            base_risk_level: SecurityRiskLevel::Low,
            description: String::new(),
            function_name: None,
            protocol: None,
            details,
        }
    }

    fn intent(data: Bytes) -> TransactionIntent {
        TransactionIntent::new(Some(Address::repeat_byte(0x42)), data, U256::ZERO, Address::ZERO, 1)
    }

    fn titles(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_every_type_has_catalog_entries() {
        for tx_type in TransactionType::ALL {
            assert!(!catalog_for(tx_type).is_empty(), "{} has no entries", tx_type);
        }
    }

    #[test]
    fn test_catalog_titles_unique() {
        let mut seen = HashSet::new();
        for entry in CATALOG {
            assert!(seen.insert(entry.title));
        }
    }

    #[test]
    fn test_sorted_by_priority() {
        let a = analysis(
            TransactionType::Transfer,
            TransactionDetails::NativeTransfer {
                eth_value: "1".into(),
                symbol: "ETH".into(),
            },
        );
        let recs = RecommendationEngine::recommend(&intent(Bytes::new()), &a, None);
        assert_eq!(titles(&recs), vec!["Double-Check Recipient Address", "Send a Test Transaction"]);
    }

    #[test]
    fn test_unlimited_approval_enrichment() {
        let spender = Address::repeat_byte(0x99);
        let data = encode_approve(spender, U256::MAX);
        let a = analysis(
            TransactionType::UnlimitedApproval,
            TransactionDetails::Approval {
                token_address: Address::repeat_byte(0x42),
                spender_address: spender,
                amount: U256::MAX,
                is_unlimited: true,
            },
        );
        let recs = RecommendationEngine::recommend(&intent(data), &a, None);
        let limit = recs.iter().find(|r| r.title == LIMIT_APPROVAL_TITLE).unwrap();
        let payload = limit.action.as_ref().and_then(|a| a.data.clone()).unwrap();
        let bytes = hex::decode(payload.trim_start_matches("0x")).unwrap();
        let (decoded_spender, amount) = decode_approve(&bytes).unwrap();
        assert_eq!(decoded_spender, spender);
        assert_eq!(amount, U256::from(SUGGESTED_APPROVAL_WEI));
    }

    #[test]
    fn test_enrichment_failure_keeps_recommendation() {
        let a = analysis(
            TransactionType::UnlimitedApproval,
            TransactionDetails::Undecoded {
                selector: "0x095ea7b3".into(),
                data_size: 8,
            },
        );
        let data = Bytes::from(vec![0x09, 0x5e, 0xa7, 0xb3, 0, 0, 0, 0]);
        let recs = RecommendationEngine::recommend(&intent(data), &a, None);
        let limit = recs.iter().find(|r| r.title == LIMIT_APPROVAL_TITLE).unwrap();
        assert!(limit.action.as_ref().unwrap().data.is_none());
    }

    #[test]
    fn test_swap_slippage_enrichment() {
        let a = analysis(
            TransactionType::SwapExactTokensForTokens,
            TransactionDetails::Swap {
                amount_in: Some(U256::from(1u64)),
                amount_in_max: None,
                amount_out: None,
                amount_out_min: Some(U256::from(1u64)),
                path: vec![],
                recipient: None,
                eth_value: None,
            },
        );
        let recs = RecommendationEngine::recommend(&intent(Bytes::new()), &a, None);
        let slippage = recs.iter().find(|r| r.title == SET_SLIPPAGE_TITLE).unwrap();
        let data = slippage.action.as_ref().unwrap().data.as_ref().unwrap();
        let json: serde_json::Value = serde_json::from_str(data).unwrap();
        assert_eq!(json["slippageBps"], 100);
    }

    #[test]
    fn test_high_risk_augmentation_skips_covered_flags() {
        let spender = Address::repeat_byte(0x99);
        let data = encode_approve(spender, U256::MAX);
        let a = analysis(
            TransactionType::UnlimitedApproval,
            TransactionDetails::Approval {
                token_address: Address::repeat_byte(0x42),
                spender_address: spender,
                amount: U256::MAX,
                is_unlimited: true,
            },
        );
        let risk = RiskScorer::default()
            .score(
                &intent(data.clone()),
                &PartialRiskFactors {
                    has_unlimited_approval: Some(true),
                    is_verified: Some(false),
                    ..Default::default()
                },
            )
            .with_floor(SecurityRiskLevel::High);

        let recs = RecommendationEngine::recommend(&intent(data), &a, Some(&risk));
        assert_eq!(recs[0].title, HIGH_RISK_ALERT_TITLE);
        assert_eq!(recs[0].priority, Priority::Critical);
        assert!(!recs
            .iter()
            .any(|r| r.title == format!("Risk: {}", FLAG_UNLIMITED_APPROVAL)));
        assert!(recs
            .iter()
            .any(|r| r.title == "Risk: Contract source code is not verified"));

        let mut seen = HashSet::new();
        assert!(recs.iter().all(|r| seen.insert(r.title.clone())));
    }

    #[test]
    fn test_low_risk_has_no_alert() {
        let a = analysis(
            TransactionType::Unknown,
            TransactionDetails::Unknown {
                selector: None,
                data_size: 0,
            },
        );
        let risk = RiskScorer::default().score(&intent(Bytes::new()), &PartialRiskFactors::default());
        let recs = RecommendationEngine::recommend(&intent(Bytes::new()), &a, Some(&risk));
        assert!(!recs.iter().any(|r| r.title == HIGH_RISK_ALERT_TITLE));
    }
}
