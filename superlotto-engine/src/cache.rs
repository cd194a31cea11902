//! TTL cache collaborator for analysis results. The analyzers stay pure;
//! callers decide what to cache and for how long.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use superlotto_db::models::Draw;
use tracing::debug;

use crate::error::Result;

pub trait AnalysisCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
    fn invalidate(&self, key: &str);
    fn clear(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache with per-entry expiry. Expired entries are dropped
/// lazily on access.
#[derive(Default)]
pub struct MemoryCache {
    inner: Mutex<MemoryCacheInner>,
}

#[derive(Default)]
struct MemoryCacheInner {
    entries: HashMap<String, Entry>,
    hits: u64,
    misses: u64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
        }
    }
}

impl AnalysisCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let now = Instant::now();
        let (value, expired) = match inner.entries.get(key) {
            Some(entry) if entry.expires_at > now => (Some(entry.value.clone()), false),
            Some(_) => (None, true),
            None => (None, false),
        };
        if expired {
            inner.entries.remove(key);
        }
        match value {
            Some(v) => {
                inner.hits += 1;
                Some(v)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn invalidate(&self, key: &str) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.remove(key);
    }

    fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.clear();
    }
}

/// Compact identity of a draw history: two analyses over histories with
/// the same count and latest draw see the same data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFingerprint {
    pub draw_count: usize,
    pub latest: Option<String>,
}

impl DataFingerprint {
    pub fn of(draws: &[Draw]) -> Self {
        let latest = draws
            .iter()
            .max_by(|a, b| {
                a.date
                    .cmp(&b.date)
                    .then_with(|| a.draw_number.cmp(&b.draw_number))
            })
            .map(|d| format!("{}#{}", d.date, d.draw_number));
        Self {
            draw_count: draws.len(),
            latest,
        }
    }
}

/// Canonical key: operation, sorted parameter list, data fingerprint.
/// Any parameter or data change yields a different key.
pub fn cache_key(
    operation: &str,
    params: &[(&str, String)],
    fingerprint: &DataFingerprint,
) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by_key(|(name, _)| *name);
    let mut key = String::from(operation);
    for (name, value) in sorted {
        key.push_str(&format!("|{name}={value}"));
    }
    key.push_str(&format!(
        "|n={}|latest={}",
        fingerprint.draw_count,
        fingerprint.latest.as_deref().unwrap_or("-")
    ));
    key
}

/// Fetches a cached value or computes and stores it. A hit that fails to
/// deserialize (schema drift) is treated as a miss and recomputed.
pub fn get_or_compute<T, F>(
    cache: &dyn AnalysisCache,
    key: &str,
    ttl: Duration,
    compute: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T>,
{
    if let Some(raw) = cache.get(key) {
        match serde_json::from_str(&raw) {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!(key, error = %e, "stale cache entry, recomputing");
                cache.invalidate(key);
            }
        }
    }
    let value = compute()?;
    if let Ok(raw) = serde_json::to_string(&value) {
        cache.set(key, raw, ttl);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::make_test_draws;

    #[test]
    fn test_set_get_roundtrip() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("k").as_deref(), Some("v"));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), Duration::from_nanos(1));
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = MemoryCache::new();
        cache.set("a", "1".to_string(), Duration::from_secs(60));
        cache.set("b", "2".to_string(), Duration::from_secs(60));
        cache.invalidate("a");
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b").as_deref(), Some("2"));
        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_cache_key_is_order_insensitive_and_data_sensitive() {
        let draws = make_test_draws(10);
        let fp = DataFingerprint::of(&draws);
        let a = cache_key(
            "frequency",
            &[("window", "365".into()), ("zone", "front".into())],
            &fp,
        );
        let b = cache_key(
            "frequency",
            &[("zone", "front".into()), ("window", "365".into())],
            &fp,
        );
        assert_eq!(a, b);

        let more = make_test_draws(11);
        let c = cache_key(
            "frequency",
            &[("zone", "front".into()), ("window", "365".into())],
            &DataFingerprint::of(&more),
        );
        assert_ne!(a, c);
    }

    #[test]
    fn test_get_or_compute_only_computes_on_miss() {
        let cache = MemoryCache::new();
        let mut calls = 0;
        let v: i64 = get_or_compute(&cache, "k", Duration::from_secs(60), || {
            calls += 1;
            Ok(41)
        })
        .unwrap();
        assert_eq!(v, 41);
        let v: i64 = get_or_compute(&cache, "k", Duration::from_secs(60), || {
            calls += 1;
            Ok(99)
        })
        .unwrap();
        assert_eq!(v, 41);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_corrupt_entry_recomputed() {
        let cache = MemoryCache::new();
        cache.set("k", "not-json{".to_string(), Duration::from_secs(60));
        let v: i64 = get_or_compute(&cache, "k", Duration::from_secs(60), || Ok(7)).unwrap();
        assert_eq!(v, 7);
    }
}
