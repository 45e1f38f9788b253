//! Pincode geocoding with TTL + capacity-bounded memoization.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use buildmart_core::{GeoPoint, Pincode};

/// Default entry lifetime.
pub const DEFAULT_TTL_HOURS: i64 = 24;
/// Default cache capacity.
pub const DEFAULT_CAPACITY: usize = 500;
/// Upper bound on a single provider lookup.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Successful provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub location: GeoPoint,
    pub formatted_address: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeocodeError {
    #[error("geocode provider error: {0}")]
    Provider(String),

    #[error("no results for pincode")]
    ZeroResults,

    #[error("provider quota exhausted")]
    QuotaExceeded,
}

/// External geocode lookup. Implementations must not cache; memoization is
/// the cache's job.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn lookup(&self, pincode: &Pincode) -> Result<GeocodeResult, GeocodeError>;
}

/// A resolved destination coordinate.
///
/// `is_approximate` must be propagated into any pricing snapshot built from
/// this location so downstream estimates are known to be imprecise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub location: GeoPoint,
    pub formatted_address: Option<String>,
    pub is_approximate: bool,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    location: GeoPoint,
    formatted_address: String,
    inserted_at: DateTime<Utc>,
}

/// Cache counters exposed as operational controls.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

/// Memoizing geocoder.
///
/// Explicitly constructed and passed by handle; owns its bounds (TTL,
/// capacity) rather than living as hidden global state. A lookup failure of
/// any kind degrades to a coarse per-region coordinate keyed by the
/// pincode's leading digit, flagged approximate.
pub struct GeocodingCache {
    provider: std::sync::Arc<dyn GeocodeProvider>,
    ttl: chrono::Duration,
    capacity: usize,
    entries: RwLock<HashMap<Pincode, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl GeocodingCache {
    pub fn new(provider: std::sync::Arc<dyn GeocodeProvider>) -> Self {
        Self::with_bounds(
            provider,
            chrono::Duration::hours(DEFAULT_TTL_HOURS),
            DEFAULT_CAPACITY,
        )
    }

    pub fn with_bounds(
        provider: std::sync::Arc<dyn GeocodeProvider>,
        ttl: chrono::Duration,
        capacity: usize,
    ) -> Self {
        Self {
            provider,
            ttl,
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Resolve a pincode to coordinates.
    ///
    /// Never fails for a validly-constructed [`Pincode`]: provider errors,
    /// zero results, and timeouts all fall back to the approximate regional
    /// coordinate.
    pub async fn resolve(&self, pincode: &Pincode) -> ResolvedLocation {
        if let Some(entry) = self.fresh_entry(pincode) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return ResolvedLocation {
                location: entry.location,
                formatted_address: Some(entry.formatted_address),
                is_approximate: false,
            };
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let lookup = self.provider.lookup(pincode);
        match tokio::time::timeout(LOOKUP_TIMEOUT, lookup).await {
            Ok(Ok(result)) => {
                self.insert(pincode.clone(), &result);
                ResolvedLocation {
                    location: result.location,
                    formatted_address: Some(result.formatted_address),
                    is_approximate: false,
                }
            }
            Ok(Err(err)) => {
                warn!(pincode = %pincode, error = %err, "geocode lookup failed, using regional fallback");
                approximate_location(pincode)
            }
            Err(_) => {
                warn!(pincode = %pincode, "geocode lookup timed out, using regional fallback");
                approximate_location(pincode)
            }
        }
    }

    fn fresh_entry(&self, pincode: &Pincode) -> Option<CacheEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(pincode)?;
        if Utc::now() - entry.inserted_at >= self.ttl {
            // Expired; the caller re-fetches and overwrites.
            return None;
        }
        Some(entry.clone())
    }

    fn insert(&self, pincode: Pincode, result: &GeocodeResult) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(&pincode) && entries.len() >= self.capacity {
            // Evict the oldest entry by insertion time.
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            pincode,
            CacheEntry {
                location: result.location,
                formatted_address: result.formatted_address.clone(),
                inserted_at: Utc::now(),
            },
        );
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
            capacity: self.capacity,
        }
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl std::fmt::Debug for GeocodingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodingCache")
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .field(
                "size",
                &self.entries.read().unwrap_or_else(PoisonError::into_inner).len(),
            )
            .finish()
    }
}

/// Coarse per-postal-region anchor coordinates, keyed by the pincode's
/// leading digit.
fn approximate_location(pincode: &Pincode) -> ResolvedLocation {
    let location = match pincode.leading_digit() {
        1 => GeoPoint::new(28.6139, 77.2090), // Delhi / north-west
        2 => GeoPoint::new(26.8467, 80.9462), // Uttar Pradesh / Uttarakhand
        3 => GeoPoint::new(26.9124, 75.7873), // Rajasthan / Gujarat
        4 => GeoPoint::new(19.0760, 72.8777), // Maharashtra / Madhya Pradesh / Goa
        5 => GeoPoint::new(17.3850, 78.4867), // Telangana / Andhra / Karnataka
        6 => GeoPoint::new(13.0827, 80.2707), // Tamil Nadu / Kerala
        7 => GeoPoint::new(22.5726, 88.3639), // West Bengal / north-east
        8 => GeoPoint::new(25.5941, 85.1376), // Bihar / Jharkhand
        _ => GeoPoint::new(23.2599, 77.4126), // Army postal / central fallback
    };
    ResolvedLocation {
        location,
        formatted_address: None,
        is_approximate: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicU32;

    /// Counts lookups; fails on demand.
    struct ScriptedProvider {
        calls: AtomicU32,
        fail: std::sync::atomic::AtomicBool,
        result: GeocodeResult,
    }

    impl ScriptedProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail: std::sync::atomic::AtomicBool::new(false),
                result: GeocodeResult {
                    location: GeoPoint::new(18.9388, 72.8354),
                    formatted_address: "Mumbai GPO, Mumbai 400001".to_string(),
                },
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeocodeProvider for ScriptedProvider {
        async fn lookup(&self, _pincode: &Pincode) -> Result<GeocodeResult, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(GeocodeError::Provider("boom".to_string()));
            }
            Ok(self.result.clone())
        }
    }

    fn pin(s: &str) -> Pincode {
        Pincode::new(s).unwrap()
    }

    #[tokio::test]
    async fn second_lookup_within_ttl_hits_cache() {
        let provider = ScriptedProvider::new();
        let cache = GeocodingCache::new(provider.clone());

        let first = cache.resolve(&pin("400001")).await;
        let second = cache.resolve(&pin("400001")).await;

        assert_eq!(provider.calls(), 1);
        assert_eq!(first, second);
        assert!(!second.is_approximate);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_fresh_lookup() {
        let provider = ScriptedProvider::new();
        let cache =
            GeocodingCache::with_bounds(provider.clone(), chrono::Duration::zero(), 10);

        cache.resolve(&pin("400001")).await;
        cache.resolve(&pin("400001")).await;

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_regional_coordinate() {
        let provider = ScriptedProvider::new();
        provider.fail.store(true, Ordering::SeqCst);
        let cache = GeocodingCache::new(provider.clone());

        let resolved = cache.resolve(&pin("400001")).await;
        assert!(resolved.is_approximate);
        assert!(resolved.formatted_address.is_none());
        // Region 4 anchor.
        assert!((resolved.location.lat - 19.0760).abs() < 1e-6);

        // Fallbacks are not cached: the next call tries the provider again.
        provider.fail.store(false, Ordering::SeqCst);
        let resolved = cache.resolve(&pin("400001")).await;
        assert!(!resolved.is_approximate);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn capacity_evicts_oldest_entry() {
        let provider = ScriptedProvider::new();
        let cache =
            GeocodingCache::with_bounds(provider.clone(), chrono::Duration::hours(24), 2);

        cache.resolve(&pin("400001")).await;
        cache.resolve(&pin("110001")).await;
        cache.resolve(&pin("600001")).await; // evicts 400001

        assert_eq!(cache.stats().size, 2);
        cache.resolve(&pin("400001")).await; // miss again
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn clear_empties_the_cache() {
        let provider = ScriptedProvider::new();
        let cache = GeocodingCache::new(provider.clone());

        cache.resolve(&pin("400001")).await;
        assert_eq!(cache.stats().size, 1);
        cache.clear();
        assert_eq!(cache.stats().size, 0);

        cache.resolve(&pin("400001")).await;
        assert_eq!(provider.calls(), 2);
    }

    #[test]
    fn every_region_digit_has_an_anchor() {
        for digit in 1..=9u8 {
            let p = pin(&format!("{digit}00001"));
            let resolved = approximate_location(&p);
            assert!(resolved.is_approximate);
            assert!(resolved.location.lat != 0.0);
        }
    }
}
