//! Flood inundation map overlay pipeline.
//!
//! A reach is selected, its catalog resolved, the rasters for the chosen
//! stage fetched and rendered, and the results placed on a [`MapCanvas`].

pub mod client;
pub mod config;
pub mod metrics;
pub mod notify;
pub mod overlay;
pub mod pipeline;
pub mod quantiles;
pub mod regions;
pub mod resolver;
pub mod viewport;

pub use client::{FimApiClient, FimSource};
pub use config::PipelineConfig;
pub use notify::{AlertLevel, CollectingNotifier, Notification, Notifier, TracingNotifier};
pub use overlay::{ImageOverlay, MapCanvas, MemoryCanvas, OverlayHandle, OverlayId, OverlayPresenter};
pub use pipeline::{BatchReport, OverlayPipeline, SelectionTracker};
pub use quantiles::{QuantilesOutcome, QuantilesService};
pub use regions::{Region, RegionsConfig};
pub use resolver::StageCatalogResolver;
pub use viewport::{LayerVisibility, Viewport, ViewportDebouncer};
