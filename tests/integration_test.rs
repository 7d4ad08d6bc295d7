//! Integration tests for TX Sentinel

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tx_sentinel::core::recommendations::{catalog_for, LIMIT_APPROVAL_TITLE};
use tx_sentinel::core::risk_score::{
    CONTRACT_SECURITY_MAX, EXTERNAL_FACTORS_MAX, IMPLEMENTATION_MAX, TRANSACTION_SPECIFIC_MAX,
    USER_TRUST_MAX,
};
use tx_sentinel::models::types::{Priority, TransactionDetails};
use tx_sentinel::{
    AppResult, ContractAge, EngineConfig, FactorCollector, PartialRiskFactors, RawTransaction,
    RecommendationEngine, RiskFactorOracle, RiskScorer, ScoringConfig, SecurityRiskLevel,
    ThreatLevel, TransactionAnalyzer, TransactionClassifier, TransactionIntent, TransactionType,
};

const USDT: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
const SPENDER: &str = "7a250d5630b4cf539739df2c5dacb4c659f2488d";
const USER: &str = "0x1234567890123456789012345678901234567890";
const SCAMMER: &str = "0x098B716B8Aaf21512996dC57EB0615e2383E2f96";

fn raw(to: Option<&str>, data: &str, value: &str) -> RawTransaction {
    RawTransaction {
        to: to.map(String::from),
        data: data.to_string(),
        value: value.to_string(),
        from: USER.to_string(),
        chain_id: 1,
    }
}

fn approve_data(amount_word: &str) -> String {
    format!("0x095ea7b3{:0>64}{}", SPENDER, amount_word)
}

fn analyzer() -> TransactionAnalyzer {
    TransactionAnalyzer::new(&EngineConfig::default())
}

#[tokio::test]
async fn test_unlimited_approval_scenario() {
    let tx = raw(Some(USDT), &approve_data(&"f".repeat(64)), "0");
    let report = analyzer().analyze_raw(&tx, PartialRiskFactors::default()).await;

    assert_eq!(report.analysis.tx_type, TransactionType::UnlimitedApproval);
    assert!(report.risk.breakdown.transaction_specific >= 20);
    assert!(report.risk.level >= SecurityRiskLevel::High);

    // Bounded replacement approve for the same spender
    let limit = report
        .recommendations
        .iter()
        .find(|r| r.title == LIMIT_APPROVAL_TITLE)
        .expect("limit approval recommendation");
    let data = limit
        .action
        .as_ref()
        .and_then(|a| a.data.as_deref())
        .expect("replacement call data");
    assert!(data.starts_with("0x095ea7b3"));
    assert!(data.contains(SPENDER));
    assert_ne!(data, approve_data(&"f".repeat(64)));
}

#[tokio::test]
async fn test_empty_transaction_scenario() {
    let report = analyzer()
        .analyze_raw(&raw(Some(USDT), "0x", "0"), PartialRiskFactors::default())
        .await;

    assert_eq!(report.analysis.tx_type, TransactionType::Unknown);
    assert_eq!(report.risk.level, SecurityRiskLevel::Low);
    assert_eq!(report.risk.score, 15);
    assert_eq!(report.risk.breakdown.transaction_specific, 0);
    assert_eq!(report.risk.breakdown.implementation, 0);
    assert_eq!(report.threat_level(), ThreatLevel::Safe);
}

#[tokio::test]
async fn test_known_scam_destination_scenario() {
    let report = analyzer()
        .analyze_raw(
            &raw(Some(SCAMMER), "0x", "1000000000000000"),
            PartialRiskFactors::default(),
        )
        .await;

    let destination = report.destination_reputation.as_ref().unwrap();
    assert!(destination.reputation.is_scam);
    assert!(report.risk.score < 50);
    assert!(report.risk.level >= SecurityRiskLevel::High);

    let assessment = report.to_assessment();
    assert_eq!(assessment.threat_level, ThreatLevel::High);
    assert!(assessment.details.transaction_details.scam_details.is_some());
}

#[test]
fn test_undecodable_approve_scenario() {
    // Spender word only, amount missing
    let data = format!("0x095ea7b3{:0>64}", SPENDER);
    let intent = TransactionIntent::parse(&raw(Some(USDT), &data, "0")).unwrap();
    let analysis = TransactionClassifier::classify(&intent);

    assert_eq!(analysis.tx_type, TransactionType::Approval);
    assert!(analysis.description.contains("unable to decode"));
    assert!(matches!(analysis.details, TransactionDetails::Undecoded { .. }));

    // Recommendations still come out, without rebuilt call data
    let recs = RecommendationEngine::recommend(&intent, &analysis, None);
    assert!(!recs.is_empty());
}

#[tokio::test]
async fn test_malformed_input_degrades() {
    let report = analyzer()
        .analyze_raw(&raw(Some("0xnot-an-address"), "0x", "0"), PartialRiskFactors::default())
        .await;
    assert_eq!(report.analysis.tx_type, TransactionType::Unknown);
    assert!(matches!(report.analysis.details, TransactionDetails::Malformed { .. }));
}

/// Every combination of the boolean risk inputs, crossed with each age bucket
fn factor_grid() -> Vec<PartialRiskFactors> {
    let ages = [
        ContractAge::New,
        ContractAge::Recent,
        ContractAge::Established,
        ContractAge::Mature,
    ];
    let mut grid = Vec::new();
    for bits in 0u32..(1 << 12) {
        let on = |i: u32| Some(bits & (1 << i) != 0);
        grid.push(PartialRiskFactors {
            is_verified: on(0),
            has_audit: on(1),
            has_unlimited_approval: on(2),
            is_high_value: on(3),
            has_complex_method: on(4),
            has_high_slippage: on(5),
            is_mev_vulnerable: on(6),
            is_unusual_pattern: on(7),
            has_interacted_before: on(8),
            is_recently_deployed: on(9),
            has_reentrancy_risk: on(10),
            has_admin_functions: on(11),
            contract_age: Some(ages[(bits % 4) as usize]),
            decentralization_score: Some(f64::from(bits % 5) / 4.0),
            ..Default::default()
        });
    }
    grid
}

#[test]
fn test_score_is_sum_of_clamped_categories() {
    let scorer = RiskScorer::new(ScoringConfig::default());
    let intent = TransactionIntent::empty(1);

    for factors in factor_grid() {
        let result = scorer.score(&intent, &factors);
        let b = &result.breakdown;

        assert!(i32::from(b.contract_security) <= CONTRACT_SECURITY_MAX);
        assert!(i32::from(b.transaction_specific) <= TRANSACTION_SPECIFIC_MAX);
        assert!(i32::from(b.user_trust) <= USER_TRUST_MAX);
        assert!(i32::from(b.external_factors) <= EXTERNAL_FACTORS_MAX);
        assert!(i32::from(b.implementation) <= IMPLEMENTATION_MAX);
        assert_eq!(result.score, b.category_total());
        assert!(result.score <= 100);

        // No override input in the grid: the band decides alone
        assert_eq!(result.level, SecurityRiskLevel::from_score(result.score));
        assert!((0.5..=1.0).contains(&result.confidence));
    }
}

#[test]
fn test_override_forces_high() {
    let scorer = RiskScorer::new(ScoringConfig::default());
    let intent = TransactionIntent::empty(1);

    let overrides = [
        PartialRiskFactors {
            is_known_scammer: Some(true),
            ..Default::default()
        },
        PartialRiskFactors {
            interacts_with_blacklisted: Some(true),
            ..Default::default()
        },
        PartialRiskFactors {
            scam_similarity: Some(0.85),
            ..Default::default()
        },
    ];

    for base in factor_grid().into_iter().step_by(37) {
        for o in &overrides {
            let result = scorer.score(&intent, &o.clone().merge(base.clone()));
            assert!(result.level >= SecurityRiskLevel::High);
            assert!(result.level >= SecurityRiskLevel::from_score(result.score));
        }
    }
}

/// Risk-increasing edits, one factor at a time
const BUMPS: &[(&str, fn(&mut PartialRiskFactors))] = &[
    ("unverified", |f| f.is_verified = Some(false)),
    ("unaudited", |f| f.has_audit = Some(false)),
    ("known scammer", |f| f.is_known_scammer = Some(true)),
    ("similarity", |f| {
        f.scam_similarity = Some((f.scam_similarity.unwrap_or(0.0) + 0.5).min(1.0))
    }),
    ("new contract", |f| f.contract_age = Some(ContractAge::New)),
    ("unlimited approval", |f| f.has_unlimited_approval = Some(true)),
    ("high value", |f| f.is_high_value = Some(true)),
    ("complex method", |f| f.has_complex_method = Some(true)),
    ("blacklisted", |f| f.interacts_with_blacklisted = Some(true)),
    ("slippage", |f| f.has_high_slippage = Some(true)),
    ("mev", |f| f.is_mev_vulnerable = Some(true)),
    ("unusual pattern", |f| f.is_unusual_pattern = Some(true)),
    ("first interaction", |f| f.has_interacted_before = Some(false)),
    ("not whitelisted", |f| f.is_whitelisted = Some(false)),
    ("recent deployment", |f| f.is_recently_deployed = Some(true)),
    ("copycat", |f| f.is_copycat = Some(true)),
    ("incidents", |f| f.has_security_incidents = Some(true)),
    ("reentrancy", |f| f.has_reentrancy_risk = Some(true)),
    ("centralized", |f| {
        f.decentralization_score = Some((f.decentralization_score.unwrap_or(1.0) - 0.5).max(0.0))
    }),
    ("admin functions", |f| f.has_admin_functions = Some(true)),
];

#[test]
fn test_riskier_input_never_lowers_level() {
    let scorer = RiskScorer::new(ScoringConfig::default());
    let intent = TransactionIntent::empty(1);

    for factors in factor_grid() {
        let before = scorer.score(&intent, &factors);
        for (name, bump) in BUMPS {
            let mut riskier = factors.clone();
            bump(&mut riskier);
            let after = scorer.score(&intent, &riskier);
            assert!(
                after.level >= before.level && after.score >= before.score,
                "{} lowered risk: {} ({:?}) -> {} ({:?})",
                name,
                before.score,
                before.level,
                after.score,
                after.level
            );
        }
    }
}

struct ScamListOracle;

#[async_trait]
impl RiskFactorOracle for ScamListOracle {
    fn name(&self) -> &'static str {
        "scam-list"
    }

    async fn collect(&self, _intent: &TransactionIntent) -> AppResult<PartialRiskFactors> {
        Ok(PartialRiskFactors {
            is_known_scammer: Some(true),
            ..Default::default()
        })
    }
}

#[tokio::test]
async fn test_oracle_scammer_verdict_survives_clean_heuristic() {
    let collector =
        FactorCollector::new(Duration::from_secs(1)).with_oracle(Arc::new(ScamListOracle));
    let analyzer = analyzer().with_collector(collector);

    // Unknown to the built-in lists
    let report = analyzer
        .analyze_raw(&raw(Some(USER), "0x", "0"), PartialRiskFactors::default())
        .await;

    assert_eq!(report.factors.is_known_scammer, Some(true));
    assert!(report.risk.level >= SecurityRiskLevel::High);
}

#[tokio::test]
async fn test_token_transfer_to_scam_recipient() {
    let scam_word = SCAMMER.trim_start_matches("0x").to_lowercase();
    let data = format!("0xa9059cbb{:0>64}{:0>64}", scam_word, "de0b6b3a7640000");
    let report = analyzer()
        .analyze_raw(&raw(Some(USDT), &data, "0"), PartialRiskFactors::default())
        .await;

    assert_eq!(report.analysis.tx_type, TransactionType::Transfer);
    assert!(report.recipient_reputation.as_ref().unwrap().reputation.is_scam);
    assert_eq!(report.factors.interacts_with_blacklisted, Some(true));
    assert!(report.risk.level >= SecurityRiskLevel::High);

    let assessment = report.to_assessment();
    let scam = assessment.details.transaction_details.scam_details.unwrap();
    assert_eq!(scam.address.to_lowercase(), SCAMMER.to_lowercase());
    assert!(assessment
        .details
        .signature_matches
        .iter()
        .any(|m| m.kind == "recipient_reputation"));
}

#[test]
fn test_confidence_tracks_supplied_factors() {
    let scorer = RiskScorer::new(ScoringConfig::default());
    let intent = TransactionIntent::empty(1);

    let none = scorer.score(&intent, &PartialRiskFactors::default());
    assert_eq!(none.confidence, 0.5);

    let some = scorer.score(
        &intent,
        &PartialRiskFactors {
            is_verified: Some(true),
            has_audit: Some(true),
            ..Default::default()
        },
    );
    assert!(some.confidence > none.confidence);
}

#[tokio::test]
async fn test_confidence_counts_observed_factors() {
    let report = analyzer()
        .analyze_raw(&raw(Some(USER), "0x", "1"), PartialRiskFactors::default())
        .await;

    // unlimited approval and complex method are observed on any decoded call
    assert_eq!(report.factors.supplied_count(), 2);
    assert!((report.risk.confidence - 0.55).abs() < 1e-9);
}

#[tokio::test]
async fn test_analysis_is_deterministic() {
    let analyzer = analyzer();
    let inputs = [
        raw(Some(USDT), &approve_data(&"f".repeat(64)), "0"),
        raw(Some(SCAMMER), "0x", "5000000000000000000"),
        raw(None, "0x6080604052", "0"),
        raw(Some(USDT), "0xdeadbeef", "0"),
    ];

    for tx in &inputs {
        let a = analyzer.analyze_raw(tx, PartialRiskFactors::default()).await;
        let b = analyzer.analyze_raw(tx, PartialRiskFactors::default()).await;
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert_eq!(a.to_assessment(), b.to_assessment());
    }
}

#[tokio::test]
async fn test_recommendations_unique_and_sorted() {
    let analyzer = analyzer();
    let supplied = PartialRiskFactors {
        is_verified: Some(false),
        has_audit: Some(false),
        contract_age: Some(ContractAge::New),
        has_high_slippage: Some(true),
        is_mev_vulnerable: Some(true),
        ..Default::default()
    };

    for tx in [
        raw(Some(USDT), &approve_data(&"f".repeat(64)), "0"),
        raw(Some(SCAMMER), "0x", "1"),
        raw(None, "0x6080604052", "0"),
    ] {
        let report = analyzer.analyze_raw(&tx, supplied.clone()).await;
        let titles: HashSet<_> = report.recommendations.iter().map(|r| &r.title).collect();
        assert_eq!(titles.len(), report.recommendations.len());

        let priorities: Vec<Priority> = report.recommendations.iter().map(|r| r.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
        assert_eq!(priorities.first(), Some(&Priority::Critical));
    }
}

#[test]
fn test_catalog_copies_are_independent() {
    let mut first = catalog_for(TransactionType::UnlimitedApproval);
    assert!(!first.is_empty());
    first[0].title.push_str(" (edited)");

    let second = catalog_for(TransactionType::UnlimitedApproval);
    assert!(!second[0].title.ends_with("(edited)"));
}

#[test]
fn test_recommend_handles_every_type() {
    for tx_type in TransactionType::ALL {
        let intent = TransactionIntent::empty(1);
        let analysis = tx_sentinel::TransactionAnalysis {
            tx_type,
            ..tx_sentinel::TransactionAnalysis::malformed("synthetic")
        };
        // Must not panic for any type, with or without a score
        let _ = RecommendationEngine::recommend(&intent, &analysis, None);
    }
}
