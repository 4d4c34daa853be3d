//! Stage Catalog Resolver: reach id to cached catalog.

use std::sync::Arc;

use fim_common::{FimError, FimResult, ReachCatalog, ReachFeature, ReachId};
use storage::CatalogCache;
use tracing::{debug, instrument};

use crate::client::FimSource;
use crate::metrics;

/// Fetches reach catalogs once and serves repeats from a side cache.
pub struct StageCatalogResolver {
    source: Arc<dyn FimSource>,
    cache: CatalogCache,
}

impl StageCatalogResolver {
    pub fn new(source: Arc<dyn FimSource>, cache_capacity: usize) -> Self {
        Self {
            source,
            cache: CatalogCache::new(cache_capacity),
        }
    }

    /// Catalog for `reach`. Fetch failures and malformed catalogs are not
    /// cached, so the next selection retries.
    #[instrument(skip(self), fields(reach_id = %reach))]
    pub async fn resolve(&self, reach: &ReachId) -> FimResult<Arc<ReachCatalog>> {
        if let Some(catalog) = self.cache.get(reach).await {
            metrics::record_catalog_cache_hit();
            debug!("Catalog served from cache");
            return Ok(catalog);
        }

        metrics::record_catalog_request();
        let catalog = self.source.fetch_catalog(reach).await?;
        catalog.validate()?;

        Ok(self.cache.put(reach.clone(), catalog).await)
    }

    /// Extract the reach id from a selected feature and resolve it.
    pub async fn resolve_feature(
        &self,
        feature: &ReachFeature,
    ) -> FimResult<(ReachId, Arc<ReachCatalog>)> {
        let reach = feature.reach_id().ok_or_else(|| {
            FimError::NotFound("feature has no COMID or reach_id attribute".to_string())
        })?;
        let catalog = self.resolve(&reach).await?;
        Ok((reach, catalog))
    }

    /// Drop a cached catalog so the next resolve refetches it.
    pub async fn forget(&self, reach: &ReachId) -> bool {
        self.cache.invalidate(reach).await
    }

    pub async fn cache_stats(&self) -> storage::CacheStats {
        self.cache.stats().await
    }
}
