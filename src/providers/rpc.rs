//! RPC Factor Oracle - on-chain contract facts over JSON-RPC
//!
//! 1. `eth_getCode` at latest: no code means an EOA, nothing to report
//! 2. Deployment block by binary search over historical `eth_getCode`
//!    (needs an archive node; failure only drops the age factors)
//! 3. Optional Etherscan-compatible `getsourcecode` lookup for verification
//!
//! Transport errors are retried once with a short linear backoff; the
//! collector's timeout bounds the whole lookup.

use alloy_primitives::Address;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::risk_factors::{ContractAge, PartialRiskFactors, RiskFactorOracle};
use crate::models::config::OracleConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::TransactionIntent;
use crate::utils::constants::{get_block_time_secs, USER_AGENT as USER_AGENT_CONST};

/// Attempts per JSON-RPC call
pub const RPC_MAX_ATTEMPTS: u32 = 2;

/// Delay before a retry
pub const RPC_RETRY_DELAY_MS: u64 = 150;

/// Per-request HTTP timeout (the collector timeout is the real bound)
pub const RPC_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Deployed less than this many seconds ago counts as "recently deployed"
pub const RECENT_DEPLOYMENT_SECS: u64 = 7 * 86_400;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: serde_json::Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// Etherscan-style `{"status", "message", "result": [...]}` envelope
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SourceCodeEntry {
    #[serde(default)]
    source_code: String,
}

#[derive(Debug, Clone)]
struct ExplorerConfig {
    url: String,
    api_key: Option<String>,
}

/// JSON-RPC backed oracle for one chain
#[derive(Clone)]
pub struct RpcFactorOracle {
    url: String,
    chain_id: u64,
    client: reqwest::Client,
    explorer: Option<ExplorerConfig>,
}

impl RpcFactorOracle {
    pub fn new(url: impl Into<String>, chain_id: u64) -> AppResult<Self> {
        Ok(Self {
            url: url.into(),
            chain_id,
            client: Self::build_client()?,
            explorer: None,
        })
    }

    /// Build from configuration, None when no RPC endpoint is configured
    pub fn from_config(config: &OracleConfig) -> AppResult<Option<Self>> {
        let Some(url) = config.rpc_url.as_deref() else {
            return Ok(None);
        };
        let chain_id = config.rpc_chain_id;
        let mut oracle = Self::new(url, chain_id)?;
        if let Some(explorer_url) = config.explorer_api_url.as_deref() {
            oracle = oracle.with_explorer(explorer_url, config.explorer_api_key.clone());
        }
        info!("🔌 RPC factor oracle ready for chain {}", chain_id);
        Ok(Some(oracle))
    }

    pub fn with_explorer(mut self, url: impl Into<String>, api_key: Option<String>) -> Self {
        self.explorer = Some(ExplorerConfig {
            url: url.into(),
            api_key,
        });
        self
    }

    fn build_client() -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(RPC_REQUEST_TIMEOUT_SECS))
            .gzip(true)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))
    }

    /// Endpoint with credentials hidden, for logging.
    ///
    /// Covers `/v2/<key>` path keys and every query parameter value.
    pub fn masked_url(&self) -> String {
        let (path, query) = match self.url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (self.url.as_str(), None),
        };

        let mut masked = match path.split_once("/v2/") {
            Some((base, _)) => format!("{}/v2/***HIDDEN***", base),
            None => path.to_string(),
        };

        if let Some(query) = query {
            let params: Vec<String> = query
                .split('&')
                .map(|param| match param.split_once('=') {
                    Some((name, _)) => format!("{}=***HIDDEN***", name),
                    None => param.to_string(),
                })
                .collect();
            masked.push('?');
            masked.push_str(&params.join("&"));
        }
        masked
    }

    /// JSON-RPC call with one retry on transport errors
    pub async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let mut last_error = None;
        for attempt in 0..RPC_MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = RPC_RETRY_DELAY_MS * u64::from(attempt);
                debug!("⏳ Retry {}/{} of {} after {}ms", attempt + 1, RPC_MAX_ATTEMPTS, method, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            match self.execute_call(&request).await {
                Ok(result) => return Ok(result),
                Err(e) if e.code.is_retryable() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| AppError::rpc_error(format!("{} failed", method))))
    }

    async fn execute_call<T: for<'de> Deserialize<'de>>(
        &self,
        request: &RpcRequest<'_>,
    ) -> AppResult<T> {
        let response = self.client.post(&self.url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::rpc_error(format!(
                "HTTP {} from {}",
                status,
                self.masked_url()
            )));
        }

        let body: RpcResponse<T> = response.json().await?;
        if let Some(error) = body.error {
            return Err(AppError::rpc_error(format!(
                "RPC error: {} (code: {})",
                error.message, error.code
            )));
        }
        body.result
            .ok_or_else(|| AppError::invalid_response(format!("No result for {}", request.method)))
    }

    pub async fn block_number(&self) -> AppResult<u64> {
        let hex: String = self.call("eth_blockNumber", serde_json::json!([])).await?;
        parse_quantity(&hex)
    }

    /// True when `address` holds code at `block` (None = latest)
    pub async fn has_code(&self, address: &Address, block: Option<u64>) -> AppResult<bool> {
        let tag = block
            .map(|b| format!("{:#x}", b))
            .unwrap_or_else(|| "latest".to_string());
        let code: String = self
            .call("eth_getCode", serde_json::json!([format!("{:#x}", address), tag]))
            .await?;
        Ok(!is_empty_code(&code))
    }

    /// Lowest block at which the contract has code
    pub async fn find_deployment_block(&self, address: &Address, latest: u64) -> AppResult<u64> {
        let (mut lo, mut hi) = (0u64, latest);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.has_code(address, Some(mid)).await? {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Ok(lo)
    }

    /// Some(true/false) when the explorer answered, None when not configured
    pub async fn is_source_verified(&self, address: &Address) -> AppResult<Option<bool>> {
        let Some(explorer) = &self.explorer else {
            return Ok(None);
        };

        let address = format!("{:#x}", address);
        let mut query = vec![
            ("module", "contract"),
            ("action", "getsourcecode"),
            ("address", address.as_str()),
        ];
        if let Some(key) = explorer.api_key.as_deref() {
            query.push(("apikey", key));
        }

        let response: ExplorerResponse = self
            .client
            .get(&explorer.url)
            .query(&query)
            .send()
            .await?
            .json()
            .await?;

        if response.status != "1" {
            return Err(AppError::invalid_response(format!(
                "Explorer returned status {}",
                response.status
            )));
        }
        let entries: Vec<SourceCodeEntry> = serde_json::from_value(response.result)?;
        Ok(Some(entries.iter().any(|e| !e.source_code.trim().is_empty())))
    }

    async fn age_factors(&self, address: &Address) -> AppResult<(ContractAge, bool)> {
        let latest = self.block_number().await?;
        let deployed = self.find_deployment_block(address, latest).await?;
        let age_secs = latest.saturating_sub(deployed) * get_block_time_secs(self.chain_id);
        debug!(
            "📅 {:#x} deployed at block {} (~{}h old)",
            address,
            deployed,
            age_secs / 3_600
        );
        Ok((ContractAge::from_age_secs(age_secs), age_secs < RECENT_DEPLOYMENT_SECS))
    }
}

#[async_trait]
impl RiskFactorOracle for RpcFactorOracle {
    fn name(&self) -> &'static str {
        "rpc"
    }

    async fn collect(&self, intent: &TransactionIntent) -> AppResult<PartialRiskFactors> {
        let Some(to) = intent.to else {
            return Ok(PartialRiskFactors::default());
        };
        if intent.chain_id != self.chain_id {
            return Err(AppError::oracle_unavailable(format!(
                "RPC oracle serves chain {}, got {}",
                self.chain_id, intent.chain_id
            )));
        }

        if !self.has_code(&to, None).await? {
            debug!("👤 {:#x} has no code, skipping contract factors", to);
            return Ok(PartialRiskFactors::default());
        }

        let mut factors = PartialRiskFactors::default();

        match self.age_factors(&to).await {
            Ok((age, recent)) => {
                factors.contract_age = Some(age);
                factors.is_recently_deployed = Some(recent);
            }
            Err(e) => warn!("⚠️ Deployment lookup failed for {:#x}: {}", to, e),
        }

        match self.is_source_verified(&to).await {
            Ok(verified) => factors.is_verified = verified,
            Err(e) => warn!("⚠️ Verification lookup failed for {:#x}: {}", to, e),
        }

        Ok(factors)
    }
}

/// Parse a 0x-prefixed JSON-RPC quantity
pub fn parse_quantity(hex: &str) -> AppResult<u64> {
    let digits = hex.trim_start_matches("0x");
    u64::from_str_radix(digits, 16)
        .map_err(|e| AppError::invalid_response(format!("Bad quantity '{}': {}", hex, e)))
}

fn is_empty_code(code: &str) -> bool {
    code.trim_start_matches("0x").is_empty()
}
