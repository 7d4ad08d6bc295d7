//! Transaction analyzer - the end-to-end pipeline
//!
//! parse -> classify -> reputation -> observe + collect factors -> score
//! -> floor by base risk -> recommend. Factor collection is the only
//! suspending step; everything after it is pure.

use alloy_primitives::Address;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::classifier::TransactionClassifier;
use crate::core::recommendations::RecommendationEngine;
use crate::core::reputation::{HeuristicReputation, ReputationOracle};
use crate::core::risk_factors::{observe, FactorCollector, PartialRiskFactors};
use crate::core::risk_score::{RiskScoreResult, RiskScorer};
use crate::models::assessment::{
    AssessedTransactionDetails, Assessment, AssessmentDetails, LlmAnalysis, ScamDetails,
    SignatureMatch, ThreatAssessment, ThreatLevel,
};
use crate::models::config::EngineConfig;
use crate::models::types::{
    AddressReputation, Priority, RawTransaction, Recommendation, TransactionAnalysis,
    TransactionDetails, TransactionIntent, TransactionType,
};
use crate::utils::decoder::is_unlimited_amount;

/// Address together with its reputation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedAddress {
    pub address: Address,
    #[serde(flatten)]
    pub reputation: AddressReputation,
}

/// Everything the pipeline produced for one intent
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReport {
    pub intent: TransactionIntent,
    pub analysis: TransactionAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_reputation: Option<RatedAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spender_reputation: Option<RatedAddress>,
    /// Receiver of a token or NFT transfer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_reputation: Option<RatedAddress>,
    /// Effective factors (supplied, observed, collected)
    pub factors: PartialRiskFactors,
    pub risk: RiskScoreResult,
    pub recommendations: Vec<Recommendation>,
}

pub struct TransactionAnalyzer {
    reputation: Arc<dyn ReputationOracle>,
    collector: FactorCollector,
    scorer: RiskScorer,
}

impl TransactionAnalyzer {
    /// Heuristic reputation, no factor oracles
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            reputation: Arc::new(HeuristicReputation::default()),
            collector: FactorCollector::new(config.oracle.factor_timeout),
            scorer: RiskScorer::new(config.scoring.clone()),
        }
    }

    pub fn with_reputation(mut self, reputation: Arc<dyn ReputationOracle>) -> Self {
        self.reputation = reputation;
        self
    }

    pub fn with_collector(mut self, collector: FactorCollector) -> Self {
        self.collector = collector;
        self
    }

    pub fn collector(&self) -> &FactorCollector {
        &self.collector
    }

    /// Analyze dashboard input. Malformed input degrades to an Unknown/Low
    /// classification instead of failing.
    pub async fn analyze_raw(
        &self,
        raw: &RawTransaction,
        supplied: PartialRiskFactors,
    ) -> TransactionReport {
        match TransactionIntent::parse(raw) {
            Ok(intent) => self.analyze(intent, supplied).await,
            Err(e) => {
                warn!("⚠️ Malformed transaction input: {}", e);
                self.degraded(TransactionIntent::empty(raw.chain_id), e.to_string(), supplied)
            }
        }
    }

    pub async fn analyze(
        &self,
        intent: TransactionIntent,
        supplied: PartialRiskFactors,
    ) -> TransactionReport {
        let collected = self.collector.collect(&intent).await;
        self.evaluate(intent, supplied, collected)
    }

    /// Synchronous pipeline over already collected factors.
    /// Precedence: supplied > observed > collected.
    pub fn evaluate(
        &self,
        intent: TransactionIntent,
        supplied: PartialRiskFactors,
        collected: PartialRiskFactors,
    ) -> TransactionReport {
        let analysis = TransactionClassifier::classify(&intent);

        let destination_reputation = intent.to.map(|to| self.rate(to));
        let spender_reputation = analysis.spender().map(|s| self.rate(s));
        let recipient_reputation = analysis.recipient().map(|r| self.rate(r));

        let counterparties: Vec<&AddressReputation> = [&spender_reputation, &recipient_reputation]
            .into_iter()
            .flatten()
            .map(|rated| &rated.reputation)
            .collect();
        let observed = observe(
            &intent,
            &analysis,
            destination_reputation.as_ref().map(|r| &r.reputation),
            &counterparties,
            self.scorer.config(),
        );
        let factors = supplied.merge(observed).merge(collected);

        let risk = self
            .scorer
            .score(&intent, &factors)
            .with_floor(analysis.base_risk_level);
        let recommendations = RecommendationEngine::recommend(&intent, &analysis, Some(&risk));

        debug!(
            "{} {} scored {} ({})",
            risk.level.emoji(),
            analysis.tx_type,
            risk.score,
            risk.level.as_str()
        );

        TransactionReport {
            intent,
            analysis,
            destination_reputation,
            spender_reputation,
            recipient_reputation,
            factors,
            risk,
            recommendations,
        }
    }

    fn degraded(
        &self,
        intent: TransactionIntent,
        reason: String,
        supplied: PartialRiskFactors,
    ) -> TransactionReport {
        let analysis = TransactionAnalysis::malformed(reason);
        let risk = self.scorer.score(&intent, &supplied);
        let recommendations = RecommendationEngine::recommend(&intent, &analysis, Some(&risk));
        TransactionReport {
            intent,
            analysis,
            destination_reputation: None,
            spender_reputation: None,
            recipient_reputation: None,
            factors: supplied,
            risk,
            recommendations,
        }
    }

    fn rate(&self, address: Address) -> RatedAddress {
        RatedAddress {
            address,
            reputation: self.check_address(&address.to_string()),
        }
    }

    /// Reputation lookup; failures fall back to the default bucket
    pub fn check_address(&self, address: &str) -> AddressReputation {
        self.reputation.check_address(address).unwrap_or_else(|e| {
            warn!("⚠️ Reputation lookup failed for {}: {}", address, e);
            AddressReputation::unknown()
        })
    }
}

// ============================================
// EXTERNAL ASSESSMENT
// ============================================

/// Reputation risk level from which an address becomes a signature match
const REPUTATION_MATCH_LEVEL: u8 = 4;

impl TransactionReport {
    pub fn threat_level(&self) -> ThreatLevel {
        ThreatLevel::from(self.risk.level)
    }

    /// Dashboard-facing view of the report
    pub fn to_assessment(&self) -> ThreatAssessment {
        let mut mitigation_suggestions = self.risk.breakdown.suggested_mitigations.clone();
        for rec in &self.recommendations {
            if rec.priority <= Priority::High && !mitigation_suggestions.contains(&rec.title) {
                mitigation_suggestions.push(rec.title.clone());
            }
        }

        ThreatAssessment {
            threat_level: self.threat_level(),
            confidence: self.risk.confidence,
            mitigation_suggestions,
            details: AssessmentDetails {
                ml_score: f64::from(self.risk.score) / 100.0,
                signature_matches: self.signature_matches(),
                similar_transactions: Vec::new(),
                transaction_type: self.analysis.tx_type.as_str().to_string(),
                transaction_details: self.assessed_details(),
                llm_analysis: LlmAnalysis {
                    assessment: Assessment::from(self.risk.level),
                    reasoning: self.reasoning(),
                },
            },
        }
    }

    fn signature_matches(&self) -> Vec<SignatureMatch> {
        let mut matches = Vec::new();
        let selector = self
            .intent
            .selector()
            .map(crate::utils::decoder::selector_hex)
            .unwrap_or_default();

        match &self.analysis.details {
            TransactionDetails::Approval {
                is_unlimited: true, ..
            } => matches.push(SignatureMatch {
                pattern: selector,
                kind: "unlimited_approval".to_string(),
                description: "Approval for an effectively unlimited token amount".to_string(),
                severity: 8,
            }),
            TransactionDetails::NftApproval { approved: true, .. } => {
                matches.push(SignatureMatch {
                    pattern: selector,
                    kind: "collection_approval".to_string(),
                    description: "Operator approval over an entire NFT collection".to_string(),
                    severity: 7,
                })
            }
            _ if self.analysis.tx_type == TransactionType::ContractDeployment => {
                matches.push(SignatureMatch {
                    pattern: "create".to_string(),
                    kind: "contract_deployment".to_string(),
                    description: "Deploys new contract bytecode".to_string(),
                    severity: 6,
                })
            }
            _ => {}
        }

        let reputations = [
            ("address_reputation", &self.destination_reputation),
            ("spender_reputation", &self.spender_reputation),
            ("recipient_reputation", &self.recipient_reputation),
        ];
        for (kind, rated) in reputations {
            let Some(RatedAddress { address, reputation }) = rated else {
                continue;
            };
            if reputation.risk_level >= REPUTATION_MATCH_LEVEL {
                matches.push(SignatureMatch {
                    pattern: format!("{:#x}", address),
                    kind: kind.to_string(),
                    description: reputation.reason.clone(),
                    severity: reputation.risk_level.min(10),
                });
            }
        }
        matches
    }

    fn assessed_details(&self) -> AssessedTransactionDetails {
        let mut out = AssessedTransactionDetails::default();
        match &self.analysis.details {
            TransactionDetails::Approval {
                token_address,
                spender_address,
                amount,
                ..
            } => {
                out.spender = Some(spender_address.to_string());
                out.token_address = Some(token_address.to_string());
                out.approval_amount = Some(if is_unlimited_amount(*amount) {
                    "unlimited".to_string()
                } else {
                    amount.to_string()
                });
            }
            TransactionDetails::TokenTransfer {
                token_address,
                recipient,
                ..
            } => {
                out.token_address = Some(token_address.to_string());
                out.recipient = Some(recipient.to_string());
            }
            TransactionDetails::NativeTransfer { .. } => {
                out.recipient = self.intent.to.map(|to| to.to_string());
            }
            TransactionDetails::NftTransfer {
                collection,
                recipient,
                ..
            } => {
                out.token_address = Some(collection.to_string());
                out.recipient = Some(recipient.to_string());
            }
            TransactionDetails::NftApproval {
                collection,
                operator,
                ..
            } => {
                out.token_address = Some(collection.to_string());
                out.spender = Some(operator.to_string());
            }
            TransactionDetails::Swap { recipient, .. } => {
                out.recipient = recipient.map(|r| r.to_string());
            }
            TransactionDetails::Liquidity { recipient, .. } => {
                out.recipient = Some(recipient.to_string());
            }
            TransactionDetails::Lending {
                asset,
                on_behalf_of,
                ..
            } => {
                out.token_address = Some(asset.to_string());
                out.recipient = Some(on_behalf_of.to_string());
            }
            _ => {}
        }

        out.scam_details = [
            &self.destination_reputation,
            &self.spender_reputation,
            &self.recipient_reputation,
        ]
        .into_iter()
        .flatten()
        .find(|rated| rated.reputation.is_scam)
        .map(|rated| ScamDetails {
            address: rated.address.to_string(),
            reason: rated.reputation.reason.clone(),
            confidence: rated.reputation.confidence,
            risk_level: rated.reputation.risk_level,
        });
        out
    }

    /// Deterministic rule-based narrative
    fn reasoning(&self) -> String {
        let mut text = format!(
            "{}. Classified as {} with a risk score of {}/100 ({}).",
            self.analysis.description,
            self.analysis.tx_type,
            self.risk.score,
            self.risk.level.as_str()
        );
        if !self.risk.breakdown.risk_flags.is_empty() {
            text.push_str(&format!(
                " Concerns: {}.",
                self.risk.breakdown.risk_flags.join("; ")
            ));
        }
        if !self.risk.breakdown.protective_flags.is_empty() {
            text.push_str(&format!(
                " Protective signals: {}.",
                self.risk.breakdown.protective_flags.join("; ")
            ));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::{AppError, AppResult};
    use crate::models::types::SecurityRiskLevel;

    struct BrokenReputation;

    impl ReputationOracle for BrokenReputation {
        fn check_address(&self, _address: &str) -> AppResult<AddressReputation> {
            Err(AppError::oracle_unavailable("reputation service down"))
        }
    }

    fn raw(to: &str, data: &str, value: &str) -> RawTransaction {
        RawTransaction {
            to: Some(to.to_string()),
            data: data.to_string(),
            value: value.to_string(),
            from: String::new(),
            chain_id: 1,
        }
    }

    #[tokio::test]
    async fn test_malformed_input_degrades() {
        let analyzer = TransactionAnalyzer::new(&EngineConfig::default());
        let report = analyzer
            .analyze_raw(
                &raw("0x1234567890123456789012345678901234567890", "0xnothex", "0"),
                PartialRiskFactors::default(),
            )
            .await;
        assert_eq!(report.analysis.tx_type, TransactionType::Unknown);
        assert_eq!(report.risk.level, SecurityRiskLevel::Low);
        assert!(report.analysis.description.contains("Malformed"));
    }

    #[tokio::test]
    async fn test_reputation_failure_is_unknown() {
        let analyzer = TransactionAnalyzer::new(&EngineConfig::default())
            .with_reputation(Arc::new(BrokenReputation));
        let report = analyzer
            .analyze_raw(
                &raw("0x098b716b8aaf21512996dc57eb0615e2383e2f96", "0x", "1"),
                PartialRiskFactors::default(),
            )
            .await;
        let rated = report.destination_reputation.unwrap();
        assert_eq!(rated.reputation, AddressReputation::unknown());
    }

    #[test]
    fn test_supplied_factors_beat_observed() {
        let analyzer = TransactionAnalyzer::new(&EngineConfig::default());
        let intent = TransactionIntent::parse(&raw(
            "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
            "0x",
            "1",
        ))
        .unwrap();
        let report = analyzer.evaluate(
            intent,
            PartialRiskFactors {
                is_known_scammer: Some(false),
                ..Default::default()
            },
            PartialRiskFactors::default(),
        );
        assert_eq!(report.factors.is_known_scammer, Some(false));
    }

    #[test]
    fn test_assessment_shape() {
        let analyzer = TransactionAnalyzer::new(&EngineConfig::default());
        let intent = TransactionIntent::parse(&raw(
            "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
            "0x",
            "1000",
        ))
        .unwrap();
        let report = analyzer.evaluate(
            intent,
            PartialRiskFactors::default(),
            PartialRiskFactors::default(),
        );
        let assessment = report.to_assessment();
        assert!(matches!(
            assessment.threat_level,
            ThreatLevel::High | ThreatLevel::Critical
        ));
        assert_eq!(assessment.details.transaction_type, "TRANSFER");
        assert!(assessment.details.similar_transactions.is_empty());
        assert!(assessment.details.transaction_details.scam_details.is_some());
        assert_eq!(assessment.details.llm_analysis.assessment, Assessment::Dangerous);
        assert!(assessment
            .details
            .signature_matches
            .iter()
            .any(|m| m.kind == "address_reputation" && m.severity == 9));

        let json = serde_json::to_value(&assessment).unwrap();
        assert!(json.get("threatLevel").is_some());
        assert!(json["details"].get("mlScore").is_some());
    }
}
