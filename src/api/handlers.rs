//! API Request Handlers

use alloy_primitives::Address;
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info};

use super::types::*;
use crate::core::analyzer::{TransactionAnalyzer, TransactionReport};
use crate::core::classifier::{TransactionClassifier, UNKNOWN_PROTOCOL};
use crate::models::assessment::Assessment;
use crate::models::types::SecurityRiskLevel;

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

/// Running totals over every analysis served
#[derive(Debug, Default)]
pub struct AnalysisStats {
    total: AtomicU64,
    low: AtomicU64,
    medium: AtomicU64,
    high: AtomicU64,
    critical: AtomicU64,
    latency_us: AtomicU64,
}

impl AnalysisStats {
    pub fn record(&self, level: SecurityRiskLevel, latency_us: u64) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.latency_us.fetch_add(latency_us, Ordering::Relaxed);
        let bucket = match level {
            SecurityRiskLevel::Low => &self.low,
            SecurityRiskLevel::Medium => &self.medium,
            SecurityRiskLevel::High => &self.high,
            SecurityRiskLevel::Critical => &self.critical,
        };
        bucket.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn avg_latency_ms(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.latency_us.load(Ordering::Relaxed) as f64 / total as f64 / 1000.0
    }
}

/// Shared application state
pub struct AppState {
    pub analyzer: Arc<TransactionAnalyzer>,
    pub stats: AnalysisStats,
    pub start_time: Instant,
    /// Global cap on in-flight batch items across all batch requests
    pub batch_semaphore: Arc<Semaphore>,
}

impl AppState {
    pub fn new(analyzer: TransactionAnalyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            stats: AnalysisStats::default(),
            start_time: Instant::now(),
            batch_semaphore: Arc::new(Semaphore::new(MAX_BATCH_SIZE)),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn bad_request(message: impl Into<String>, start: Instant) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(ApiError::bad_request(message), elapsed_ms(start))),
    )
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Transaction Analysis
// ============================================

pub async fn analyze_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeTransactionRequest>,
) -> ApiResult<AnalyzeTransactionData> {
    let start = Instant::now();

    let report = state
        .analyzer
        .analyze_raw(&req.transaction, req.risk_factors)
        .await;
    state
        .stats
        .record(report.risk.level, start.elapsed().as_micros() as u64);

    info!(
        "{} {} analyzed: score {} ({}) in {:.1}ms",
        report.risk.level.emoji(),
        report.analysis.tx_type,
        report.risk.score,
        report.risk.level.as_str(),
        elapsed_ms(start)
    );

    let data = AnalyzeTransactionData {
        analysis_id: uuid::Uuid::new_v4().to_string(),
        assessment: report.to_assessment(),
        report: req.include_report.then_some(report),
    };

    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

// ============================================
// Batch Analysis
// ============================================

pub async fn batch_analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchAnalysisRequest>,
) -> ApiResult<BatchAnalysisData> {
    let start = Instant::now();

    if req.transactions.is_empty() {
        return Err(bad_request("transactions array cannot be empty", start));
    }
    if req.transactions.len() > MAX_BATCH_SIZE {
        return Err(bad_request(
            format!("Maximum {} transactions per batch request", MAX_BATCH_SIZE),
            start,
        ));
    }

    let total_requested = req.transactions.len();
    let concurrency = req.concurrency.clamp(1, MAX_BATCH_CONCURRENCY);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut handles = Vec::with_capacity(total_requested);

    for (index, item) in req.transactions.into_iter().enumerate() {
        let sem = semaphore.clone();
        let global = state.batch_semaphore.clone();
        let analyzer = state.analyzer.clone();

        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire_owned().await;
            let _global = global.acquire_owned().await;
            let item_start = Instant::now();
            let report = analyzer.analyze_raw(&item.transaction, item.risk_factors).await;
            let latency_us = item_start.elapsed().as_micros() as u64;
            (index, report, latency_us)
        }));
    }

    let mut results = Vec::with_capacity(total_requested);
    for (index, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok((index, report, latency_us)) => {
                state.stats.record(report.risk.level, latency_us);
                results.push(batch_success(index, &report, latency_us));
            }
            Err(e) => {
                error!("❌ Batch item {} failed: {}", index, e);
                results.push(BatchTransactionResult {
                    index,
                    status: "error".to_string(),
                    assessment: None,
                    risk_score: None,
                    error: Some(e.to_string()),
                    latency_ms: 0.0,
                });
            }
        }
    }

    let count = |wanted: Assessment| {
        results
            .iter()
            .filter_map(|r| r.assessment.as_ref())
            .filter(|a| a.details.llm_analysis.assessment == wanted)
            .count()
    };
    let total_safe = count(Assessment::Safe);
    let total_suspicious = count(Assessment::Suspicious);
    let total_dangerous = count(Assessment::Dangerous);
    let total_processed = results.iter().filter(|r| r.status == "success").count();

    info!(
        "📦 Batch of {} analyzed in {:.1}ms ({} dangerous)",
        total_requested,
        elapsed_ms(start),
        total_dangerous
    );

    let data = BatchAnalysisData {
        total_requested,
        total_processed,
        total_safe,
        total_suspicious,
        total_dangerous,
        results,
        processing_time_ms: elapsed_ms(start),
    };

    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

fn batch_success(index: usize, report: &TransactionReport, latency_us: u64) -> BatchTransactionResult {
    BatchTransactionResult {
        index,
        status: "success".to_string(),
        assessment: Some(report.to_assessment()),
        risk_score: Some(report.risk.score),
        error: None,
        latency_ms: latency_us as f64 / 1000.0,
    }
}

// ============================================
// Address Check
// ============================================

pub async fn check_address(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddressCheckRequest>,
) -> ApiResult<AddressCheckData> {
    let start = Instant::now();

    let address = Address::from_str(req.address.trim())
        .map_err(|_| bad_request(format!("Invalid address: {}", req.address), start))?;

    let reputation = state.analyzer.check_address(&req.address);
    let protocol = TransactionClassifier::detect_protocol(&address);

    let data = AddressCheckData {
        address: address.to_checksum(None),
        reputation,
        protocol: (protocol != UNKNOWN_PROTOCOL).then(|| protocol.to_string()),
    };

    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let stats = &state.stats;

    let data = StatsData {
        total_analyzed: stats.total(),
        total_low: stats.low.load(Ordering::Relaxed),
        total_medium: stats.medium.load(Ordering::Relaxed),
        total_high: stats.high.load(Ordering::Relaxed),
        total_critical: stats.critical.load(Ordering::Relaxed),
        avg_latency_ms: stats.avg_latency_ms(),
        factor_oracles: state
            .analyzer
            .collector()
            .oracle_names()
            .into_iter()
            .map(String::from)
            .collect(),
        uptime_seconds: state.uptime_seconds(),
        api_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record() {
        let stats = AnalysisStats::default();
        assert_eq!(stats.avg_latency_ms(), 0.0);

        stats.record(SecurityRiskLevel::Low, 1_000);
        stats.record(SecurityRiskLevel::High, 3_000);

        assert_eq!(stats.total(), 2);
        assert_eq!(stats.low.load(Ordering::Relaxed), 1);
        assert_eq!(stats.high.load(Ordering::Relaxed), 1);
        assert!((stats.avg_latency_ms() - 2.0).abs() < 1e-9);
    }
}
