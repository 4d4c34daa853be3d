//! In-memory LRU side cache of reach catalogs.
//!
//! Repeated selection of the same reach is served from here instead of
//! refetching. Catalog records do not expire; capacity bounds memory.

use std::num::NonZeroUsize;
use std::sync::Arc;

use fim_common::{ReachCatalog, ReachId};
use lru::LruCache;
use tokio::sync::Mutex;

use crate::stats::{CacheCounters, CacheStats};

pub const DEFAULT_CAPACITY: usize = 256;

pub struct CatalogCache {
    cache: Mutex<LruCache<ReachId, Arc<ReachCatalog>>>,
    counters: CacheCounters,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CatalogCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            counters: CacheCounters::default(),
        }
    }

    pub async fn get(&self, reach: &ReachId) -> Option<Arc<ReachCatalog>> {
        let mut cache = self.cache.lock().await;
        match cache.get(reach) {
            Some(catalog) => {
                self.counters.hit();
                Some(Arc::clone(catalog))
            }
            None => {
                self.counters.miss();
                None
            }
        }
    }

    pub async fn put(&self, reach: ReachId, catalog: ReachCatalog) -> Arc<ReachCatalog> {
        let catalog = Arc::new(catalog);
        let mut cache = self.cache.lock().await;
        if let Some((evicted, _)) = cache.push(reach.clone(), Arc::clone(&catalog)) {
            if evicted != reach {
                self.counters.evict();
            }
        }
        catalog
    }

    pub async fn invalidate(&self, reach: &ReachId) -> bool {
        self.cache.lock().await.pop(reach).is_some()
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.len().await;
        self.counters.snapshot(entries)
    }
}
