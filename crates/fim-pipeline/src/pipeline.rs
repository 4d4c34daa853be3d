//! Overlay pipeline: reach selection through to placed overlays.
//!
//! Each selection gets a generation number. Every COG of a selection runs
//! fetch, decode, reproject, rasterize and present on its own; a failure is
//! reported and the siblings carry on. Results that finish after the
//! selection changed are dropped instead of presented.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use fim_common::{FimError, FimResult, GeographicBounds, ReachCatalog, ReachFeature, ReachId};
use futures::future::join_all;
use renderer::{rasterize_with_style, OverlayStyle, RenderMode, RgbaImage};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::client::FimSource;
use crate::config::PipelineConfig;
use crate::metrics;
use crate::notify::{Notification, Notifier};
use crate::overlay::{MapCanvas, OverlayHandle, OverlayPresenter};
use crate::resolver::StageCatalogResolver;

/// Monotonic selection counter. A pipeline run is current while the
/// generation it started under is still the latest.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    generation: AtomicU64,
}

impl SelectionTracker {
    /// Start a new selection, invalidating all earlier ones.
    pub fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// What happened to one stage selection.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub generation: u64,
    pub reach: Option<ReachId>,
    pub stage_m: f64,
    pub flow_cms: Option<f64>,
    pub presented: Vec<OverlayHandle>,
    #[serde(serialize_with = "failures_as_text")]
    pub failed: Vec<(String, FimError)>,
    pub dropped_stale: usize,
}

fn failures_as_text<S: serde::Serializer>(
    failed: &[(String, FimError)],
    s: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    let mut seq = s.serialize_seq(Some(failed.len()))?;
    for (url, err) in failed {
        seq.serialize_element(&(url, err.to_string()))?;
    }
    seq.end()
}

impl BatchReport {
    /// True when the stage matched no rasters.
    pub fn is_empty(&self) -> bool {
        self.presented.is_empty() && self.failed.is_empty() && self.dropped_stale == 0
    }
}

enum FileOutcome {
    Presented(OverlayHandle),
    Stale,
    Failed(FimError),
}

/// A decoded, reprojected and rasterized COG, ready to present.
struct PreparedOverlay {
    image: RgbaImage,
    bounds: GeographicBounds,
}

pub struct OverlayPipeline {
    resolver: StageCatalogResolver,
    source: Arc<dyn FimSource>,
    presenter: OverlayPresenter,
    notifier: Arc<dyn Notifier>,
    mode: RenderMode,
    style: OverlayStyle,
    max_decode_bytes: usize,
    tracker: SelectionTracker,
}

impl OverlayPipeline {
    pub fn new(
        source: Arc<dyn FimSource>,
        canvas: Arc<dyn MapCanvas>,
        notifier: Arc<dyn Notifier>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            resolver: StageCatalogResolver::new(source.clone(), config.catalog_cache_capacity),
            source,
            presenter: OverlayPresenter::new(
                canvas,
                config.overlay_opacity,
                config.overlay_z_index,
            ),
            notifier,
            mode: config.render_mode,
            style: OverlayStyle::default(),
            max_decode_bytes: config.max_decode_bytes,
            tracker: SelectionTracker::default(),
        }
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn resolver(&self) -> &StageCatalogResolver {
        &self.resolver
    }

    pub fn presenter(&self) -> &OverlayPresenter {
        &self.presenter
    }

    pub fn render_mode(&self) -> RenderMode {
        self.mode
    }

    pub fn current_generation(&self) -> u64 {
        self.tracker.current()
    }

    /// Replace the current selection with `feature` at `stage_m`.
    ///
    /// Overlays of the previous selection are removed first. A catalog
    /// failure is notified and returned; per-file failures are notified and
    /// listed in the report.
    #[instrument(skip(self, feature), fields(stage = stage_m))]
    pub async fn select_reach(&self, feature: &ReachFeature, stage_m: f64) -> FimResult<BatchReport> {
        let generation = self.begin_selection().await;

        let (reach, catalog) = match self.resolver.resolve_feature(feature).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Catalog lookup failed");
                self.notify_if_current(generation, Notification::catalog_failed(&e));
                return Err(e);
            }
        };
        info!(reach_id = %reach, name = %feature.display_name(), "Reach selected");

        Ok(self.run_stage(generation, &reach, &catalog, stage_m).await)
    }

    /// Show `stage_m` for an already-selected reach. The catalog comes from
    /// the side cache when present.
    #[instrument(skip(self), fields(reach_id = %reach, stage = stage_m))]
    pub async fn select_stage(&self, reach: &ReachId, stage_m: f64) -> FimResult<BatchReport> {
        let generation = self.begin_selection().await;

        let catalog = match self.resolver.resolve(reach).await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "Catalog lookup failed");
                self.notify_if_current(generation, Notification::catalog_failed(&e));
                return Err(e);
            }
        };

        Ok(self.run_stage(generation, reach, &catalog, stage_m).await)
    }

    /// Drop the current selection. Idempotent; returns how many overlays
    /// were removed. In-flight results of the old selection are discarded.
    pub async fn deselect(&self) -> usize {
        self.tracker.advance();
        self.presenter.clear_all().await
    }

    /// Superseded selections stay silent.
    fn notify_if_current(&self, generation: u64, notification: Notification) {
        if self.tracker.is_current(generation) {
            self.notifier.notify(notification);
        } else {
            debug!(generation, title = %notification.title, "Suppressed notification of a superseded selection");
        }
    }

    async fn begin_selection(&self) -> u64 {
        let generation = self.tracker.advance();
        let removed = self.presenter.clear_all().await;
        debug!(generation, removed, "Selection started");
        generation
    }

    async fn run_stage(
        &self,
        generation: u64,
        reach: &ReachId,
        catalog: &ReachCatalog,
        stage_m: f64,
    ) -> BatchReport {
        let mut report = BatchReport {
            generation,
            reach: Some(reach.clone()),
            stage_m,
            ..Default::default()
        };

        let selection = match catalog.select_stage(stage_m) {
            Some(selection) if !selection.urls.is_empty() => selection,
            _ => {
                debug!("{}", FimError::NoMatch { stage: stage_m });
                self.notify_if_current(generation, Notification::no_files_for_stage(reach, stage_m));
                return report;
            }
        };
        report.flow_cms = selection.flow_cms;

        self.run_batch(generation, selection.urls, &mut report).await;
        info!(
            presented = report.presented.len(),
            failed = report.failed.len(),
            dropped_stale = report.dropped_stale,
            "Stage batch finished"
        );
        report
    }

    async fn run_batch(&self, generation: u64, urls: Vec<String>, report: &mut BatchReport) {
        let outcomes = join_all(urls.iter().map(|url| self.process_file(generation, url))).await;

        for (url, outcome) in urls.into_iter().zip(outcomes) {
            match outcome {
                FileOutcome::Presented(handle) => report.presented.push(handle),
                FileOutcome::Stale => report.dropped_stale += 1,
                FileOutcome::Failed(e) => report.failed.push((url, e)),
            }
        }
    }

    #[instrument(skip(self, url), fields(url = %url))]
    async fn process_file(&self, generation: u64, url: &str) -> FileOutcome {
        let result = self.try_file(generation, url).await;

        match result {
            Ok(Some(handle)) => FileOutcome::Presented(handle),
            Ok(None) => {
                metrics::record_overlay_dropped_stale();
                debug!(generation, "Dropped overlay of a superseded selection");
                FileOutcome::Stale
            }
            Err(e) => {
                metrics::record_cog_failure(failure_kind(&e));
                warn!(error = %e, "COG failed");
                self.notify_if_current(generation, Notification::cog_failed(url, &e));
                FileOutcome::Failed(e)
            }
        }
    }

    /// `Ok(None)` when the selection moved on before the overlay was placed.
    async fn try_file(&self, generation: u64, url: &str) -> FimResult<Option<OverlayHandle>> {
        let bytes = self.source.fetch_cog(url).await?;
        if !self.tracker.is_current(generation) {
            return Ok(None);
        }

        let prepared = prepare_overlay(bytes, self.mode, self.style, self.max_decode_bytes).await?;
        let tracker = &self.tracker;
        self.presenter
            .present_if(&prepared.image, prepared.bounds, url, || {
                tracker.is_current(generation)
            })
            .await
    }
}

/// Decode, reproject and rasterize off the async runtime.
async fn prepare_overlay(
    bytes: bytes::Bytes,
    mode: RenderMode,
    style: OverlayStyle,
    max_decode_bytes: usize,
) -> FimResult<PreparedOverlay> {
    tokio::task::spawn_blocking(move || -> FimResult<PreparedOverlay> {
        let raster = cog_reader::decode_with_limit(&bytes, max_decode_bytes)?;
        let bounds = projection::conus_extent_to_wgs84(raster.extent())?;

        let started = Instant::now();
        let image = rasterize_with_style(&raster, mode, &style);
        metrics::record_rasterize_duration(started.elapsed());

        Ok(PreparedOverlay { image, bounds })
    })
    .await
    .map_err(|e| FimError::Internal(format!("overlay task failed: {}", e)))?
}

fn failure_kind(err: &FimError) -> &'static str {
    match err {
        FimError::Network(_) | FimError::HttpStatus { .. } => "network",
        FimError::Decode(_) => "decode",
        FimError::InvalidResponse(_) => "invalid_response",
        FimError::ReprojectionInput(_) => "reprojection",
        FimError::Render(_) => "render",
        _ => "other",
    }
}
