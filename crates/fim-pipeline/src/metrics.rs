//! Metric names and recording helpers for the overlay pipeline.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host installs a recorder.

use std::time::Duration;

use metrics::{counter, histogram};

pub const CATALOG_REQUESTS: &str = "fim_catalog_requests_total";
pub const CATALOG_CACHE_HITS: &str = "fim_catalog_cache_hits_total";
pub const COG_FAILURES: &str = "fim_cog_failures_total";
pub const OVERLAYS_PRESENTED: &str = "fim_overlays_presented_total";
pub const OVERLAYS_DROPPED_STALE: &str = "fim_overlays_dropped_stale_total";
pub const QUANTILES_CACHE_HITS: &str = "fim_quantiles_cache_hits_total";
pub const RASTERIZE_DURATION: &str = "fim_rasterize_duration_seconds";

pub fn record_catalog_request() {
    counter!(CATALOG_REQUESTS).increment(1);
}

pub fn record_catalog_cache_hit() {
    counter!(CATALOG_CACHE_HITS).increment(1);
}

pub fn record_cog_failure(kind: &'static str) {
    counter!(COG_FAILURES, "kind" => kind).increment(1);
}

pub fn record_overlay_presented() {
    counter!(OVERLAYS_PRESENTED).increment(1);
}

pub fn record_overlay_dropped_stale() {
    counter!(OVERLAYS_DROPPED_STALE).increment(1);
}

pub fn record_quantiles_cache_hit() {
    counter!(QUANTILES_CACHE_HITS).increment(1);
}

pub fn record_rasterize_duration(elapsed: Duration) {
    histogram!(RASTERIZE_DURATION).record(elapsed.as_secs_f64());
}
