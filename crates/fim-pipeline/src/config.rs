//! Configuration for the overlay pipeline.

use std::time::Duration;

use fim_common::{FimError, FimResult};
use renderer::RenderMode;
use serde::{Deserialize, Serialize};

/// Configuration for the overlay pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base URL of the inundation API (catalog and quantiles endpoints).
    pub api_base: String,

    /// Whole-request timeout for API and COG fetches.
    pub request_timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// Alpha mapping for present pixels.
    pub render_mode: RenderMode,

    /// Overlay opacity on the map (0-1).
    pub overlay_opacity: f32,

    /// Stacking order of overlays; above base and WMS layers.
    pub overlay_z_index: i32,

    /// Maximum age of a cached quantile series.
    pub quantiles_max_age_secs: u64,

    /// Reach catalogs kept in the LRU side cache.
    pub catalog_cache_capacity: usize,

    /// Quiet period before a viewport change is acted on.
    pub viewport_debounce_ms: u64,

    /// WMS layers are hidden below this zoom.
    pub min_wms_zoom: f64,

    /// Flowline features are hidden below this zoom.
    pub min_feature_zoom: f64,

    /// Cap on the decoded sample buffer of a single COG.
    pub max_decode_bytes: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".to_string(),
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
            render_mode: RenderMode::Auto,
            overlay_opacity: 0.8,
            overlay_z_index: 1000,
            quantiles_max_age_secs: 24 * 60 * 60,
            catalog_cache_capacity: 256,
            viewport_debounce_ms: 350,
            min_wms_zoom: 9.0,
            min_feature_zoom: 9.0,
            max_decode_bytes: cog_reader::DEFAULT_MAX_DECODE_BYTES,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable variables keep their defaults; an unknown
    /// render mode is a configuration error.
    pub fn from_env() -> FimResult<Self> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("FIM_API_BASE") {
            config.api_base = val;
        }

        if let Ok(val) = std::env::var("FIM_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.request_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("FIM_RENDER_MODE") {
            config.render_mode = val.parse().map_err(FimError::Config)?;
        }

        if let Ok(val) = std::env::var("FIM_QUANTILES_MAX_AGE_SECS") {
            if let Ok(secs) = val.parse() {
                config.quantiles_max_age_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("FIM_CATALOG_CACHE_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.catalog_cache_capacity = capacity;
            }
        }

        if let Ok(val) = std::env::var("FIM_MAX_DECODE_BYTES") {
            if let Ok(bytes) = val.parse() {
                config.max_decode_bytes = bytes;
            }
        }

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> FimResult<()> {
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(FimError::Config(format!(
                "api_base must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }

        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(FimError::Config("timeouts must be > 0".to_string()));
        }

        if !(0.0..=1.0).contains(&self.overlay_opacity) {
            return Err(FimError::Config(format!(
                "overlay_opacity must be within 0-1, got {}",
                self.overlay_opacity
            )));
        }

        if self.catalog_cache_capacity == 0 {
            return Err(FimError::Config(
                "catalog_cache_capacity must be > 0".to_string(),
            ));
        }

        if self.max_decode_bytes == 0 {
            return Err(FimError::Config("max_decode_bytes must be > 0".to_string()));
        }

        Ok(())
    }

    /// `api_base` without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn quantiles_max_age(&self) -> Duration {
        Duration::from_secs(self.quantiles_max_age_secs)
    }

    pub fn viewport_debounce(&self) -> Duration {
        Duration::from_millis(self.viewport_debounce_ms)
    }
}
