//! Quantiles service: historical quantile series per reach, behind a TTL cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use fim_common::{FimResult, QuantileSeries, ReachId};
use storage::QuantilesCache;
use tracing::{debug, instrument};

use crate::client::FimSource;
use crate::metrics;

/// Result of a quantiles lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantilesOutcome {
    Loaded {
        series: Arc<QuantileSeries>,
        from_cache: bool,
    },
    /// Upstream has no records for the reach (or none that fall in the
    /// requested year). Not cached, so a later lookup asks again.
    NoData,
}

impl QuantilesOutcome {
    pub fn series(&self) -> Option<&Arc<QuantileSeries>> {
        match self {
            QuantilesOutcome::Loaded { series, .. } => Some(series),
            QuantilesOutcome::NoData => None,
        }
    }
}

pub struct QuantilesService {
    source: Arc<dyn FimSource>,
    cache: QuantilesCache,
}

impl QuantilesService {
    pub fn new(source: Arc<dyn FimSource>, max_age: Duration) -> Self {
        Self {
            source,
            cache: QuantilesCache::new(max_age),
        }
    }

    pub fn cache(&self) -> &QuantilesCache {
        &self.cache
    }

    /// Cached series for `reach`, or fetch and anchor the records to `year`.
    ///
    /// A cached entry is returned regardless of the year it was built for;
    /// entries live for at most the cache's max age.
    #[instrument(skip(self), fields(reach_id = %reach))]
    pub async fn fetch_or_load(&self, reach: &ReachId, year: i32) -> FimResult<QuantilesOutcome> {
        if let Some(series) = self.cache.get(reach).await {
            metrics::record_quantiles_cache_hit();
            return Ok(QuantilesOutcome::Loaded {
                series,
                from_cache: true,
            });
        }

        let records = self.source.fetch_quantiles(reach).await?;
        if records.is_empty() {
            debug!("No quantile records upstream");
            return Ok(QuantilesOutcome::NoData);
        }

        let series = QuantileSeries::from_records(&records, year);
        if series.is_empty() {
            debug!(records = records.len(), "No quantile records fall in {}", year);
            return Ok(QuantilesOutcome::NoData);
        }

        let series = self.cache.put(reach.clone(), series).await;
        Ok(QuantilesOutcome::Loaded {
            series,
            from_cache: false,
        })
    }

    /// [`fetch_or_load`](Self::fetch_or_load) anchored to the current local year.
    pub async fn fetch_or_load_current(&self, reach: &ReachId) -> FimResult<QuantilesOutcome> {
        let year = chrono::Local::now().year();
        self.fetch_or_load(reach, year).await
    }

    pub async fn invalidate(&self, reach: &ReachId) -> bool {
        self.cache.invalidate(reach).await
    }
}
