//! In-memory caches for the flood inundation overlay pipeline.
//!
//! - [`CatalogCache`]: LRU side cache of reach catalogs
//! - [`QuantilesCache`]: 24 h time-bounded cache of quantile series

pub mod catalog_cache;
pub mod quantiles_cache;
mod stats;

pub use catalog_cache::CatalogCache;
pub use quantiles_cache::{QuantilesCache, DEFAULT_MAX_AGE};
pub use stats::CacheStats;
