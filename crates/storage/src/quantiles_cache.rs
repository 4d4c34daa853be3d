//! Time-bounded cache of historical quantile series, keyed by reach.
//!
//! Entries are valid while `now - inserted_at <= max_age`. Expiry is lazy:
//! an expired entry is removed by the read that discovers it, there is no
//! background sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fim_common::{QuantileSeries, ReachId};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::stats::{CacheCounters, CacheStats};

/// Default maximum entry age (24 hours).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

struct CachedSeries {
    data: Arc<QuantileSeries>,
    inserted_at: Instant,
}

pub struct QuantilesCache {
    entries: RwLock<HashMap<ReachId, CachedSeries>>,
    max_age: Duration,
    counters: CacheCounters,
}

impl Default for QuantilesCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}

impl QuantilesCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_age,
            counters: CacheCounters::default(),
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Cached series for `reach`, removing it if it has expired.
    pub async fn get(&self, reach: &ReachId) -> Option<Arc<QuantileSeries>> {
        let mut entries = self.entries.write().await;

        match entries.get(reach) {
            None => {
                self.counters.miss();
                return None;
            }
            Some(entry) if entry.inserted_at.elapsed() <= self.max_age => {
                self.counters.hit();
                return Some(Arc::clone(&entry.data));
            }
            Some(_) => {}
        }

        entries.remove(reach);
        self.counters.expire();
        self.counters.miss();
        debug!(reach_id = %reach, "Quantiles cache entry expired");
        None
    }

    /// True when a fresh entry exists. Does not evict or count.
    pub async fn contains(&self, reach: &ReachId) -> bool {
        self.entries
            .read()
            .await
            .get(reach)
            .is_some_and(|e| e.inserted_at.elapsed() <= self.max_age)
    }

    /// Store `data`, replacing any previous entry and resetting its age.
    pub async fn put(&self, reach: ReachId, data: QuantileSeries) -> Arc<QuantileSeries> {
        let data = Arc::new(data);
        self.entries.write().await.insert(
            reach,
            CachedSeries {
                data: Arc::clone(&data),
                inserted_at: Instant::now(),
            },
        );
        data
    }

    pub async fn invalidate(&self, reach: &ReachId) -> bool {
        self.entries.write().await.remove(reach).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, including expired ones not yet read.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.len().await;
        self.counters.snapshot(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reach(id: &str) -> ReachId {
        ReachId::new(id).unwrap()
    }

    fn series(year: i32) -> QuantileSeries {
        QuantileSeries::from_records(&[], year)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = QuantilesCache::default();
        cache.put(reach("101"), series(2026)).await;

        let hit = cache.get(&reach("101")).await.unwrap();
        assert_eq!(hit.year, 2026);
        assert!(cache.get(&reach("202")).await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_expiry() {
        let cache = QuantilesCache::new(Duration::from_secs(60));
        cache.put(reach("101"), series(2026)).await;

        tokio::time::advance(Duration::from_secs(61)).await;

        // Still stored until a read discovers it
        assert_eq!(cache.len().await, 1);
        assert!(!cache.contains(&reach("101")).await);
        assert_eq!(cache.len().await, 1);

        assert!(cache.get(&reach("101")).await.is_none());
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.stats().await.expired, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_at_exact_max_age() {
        let cache = QuantilesCache::new(Duration::from_secs(60));
        cache.put(reach("101"), series(2026)).await;

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(cache.get(&reach("101")).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = QuantilesCache::default();
        cache.put(reach("1"), series(2026)).await;
        cache.put(reach("2"), series(2026)).await;

        assert!(cache.invalidate(&reach("1")).await);
        assert!(!cache.invalidate(&reach("1")).await);
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
