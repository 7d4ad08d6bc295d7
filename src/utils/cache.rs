//! High-Performance In-Memory Cache Module
//!
//! Thread-safe memo of contract-level risk factors, keyed by
//! `chain:address`. DashMap gives concurrent access without a global lock.
//!
//! Features:
//! - TTL-based expiration (5 minutes default)
//! - Key normalization (lowercase)
//! - Cache HIT/MISS logging and counters

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::core::risk_factors::PartialRiskFactors;
use crate::utils::constants::DEFAULT_CACHE_TTL_SECS;

/// Cache entry with creation timestamp for TTL validation
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub factors: PartialRiskFactors,
    pub created_at: Instant,
    pub ttl_secs: u64,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= Duration::from_secs(self.ttl_secs)
    }

    /// Seconds left before expiry
    pub fn remaining_ttl(&self) -> u64 {
        let elapsed = self.created_at.elapsed().as_secs();
        self.ttl_secs.saturating_sub(elapsed)
    }
}

#[derive(Clone)]
pub struct FactorCache {
    /// lowercase `chain:address` -> entry
    store: Arc<DashMap<String, CacheEntry>>,
    ttl_secs: u64,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Default for FactorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FactorCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL_SECS)
    }

    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl_secs,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    fn normalize_key(key: &str) -> String {
        key.to_lowercase()
    }

    /// Some(factors) on a live HIT; expired entries are evicted and count as MISS
    pub fn get(&self, key: &str) -> Option<PartialRiskFactors> {
        let key = Self::normalize_key(key);

        if let Some(entry) = self.store.get(&key) {
            if entry.is_expired() {
                drop(entry); // release read lock before remove
                self.store.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS (expired): {}", key);
                None
            } else {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("✅ CACHE HIT: {} (TTL: {}s remaining)", key, entry.remaining_ttl());
                Some(entry.factors.clone())
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 CACHE MISS: {}", key);
            None
        }
    }

    /// Store a successful lookup. Failures are never cached.
    pub fn set(&self, key: &str, factors: PartialRiskFactors) {
        let key = Self::normalize_key(key);
        let entry = CacheEntry {
            factors,
            created_at: Instant::now(),
            ttl_secs: self.ttl_secs,
        };

        self.store.insert(key.clone(), entry);
        debug!("💾 CACHE SET: {} (TTL: {}s)", key, self.ttl_secs);
    }

    pub fn invalidate(&self, key: &str) {
        let key = Self::normalize_key(key);
        self.store.remove(&key);
        debug!("🗑️ CACHE INVALIDATE: {}", key);
    }

    /// Drop every expired entry, returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let removed = before - self.store.len();
        if removed > 0 {
            info!("🧹 CACHE CLEANUP: {} expired entries removed", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl_secs,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}
