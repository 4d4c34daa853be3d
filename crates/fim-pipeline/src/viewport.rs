//! Map viewport state, zoom-gated layer visibility and debouncing.

use std::time::Duration;

use fim_common::GeographicBounds;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use crate::config::PipelineConfig;

/// What the map currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f64,
    pub bounds: GeographicBounds,
}

/// Which zoom-gated layers are visible for a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayerVisibility {
    pub wms: bool,
    pub features: bool,
}

impl LayerVisibility {
    pub fn for_zoom(zoom: f64, min_wms_zoom: f64, min_feature_zoom: f64) -> Self {
        Self {
            wms: zoom >= min_wms_zoom,
            features: zoom >= min_feature_zoom,
        }
    }

    pub fn for_viewport(viewport: &Viewport, config: &PipelineConfig) -> Self {
        Self::for_zoom(viewport.zoom, config.min_wms_zoom, config.min_feature_zoom)
    }
}

/// Coalesces bursts of viewport updates (pan/zoom gestures).
///
/// Each update restarts the quiet period; only the last update of a burst
/// is emitted once `quiet` passes without another.
///
/// Dropping the debouncer flushes a pending update and closes the receiver.
pub struct ViewportDebouncer {
    tx: mpsc::UnboundedSender<Viewport>,
}

impl ViewportDebouncer {
    /// Spawn the debouncing task. Settled viewports arrive on the receiver.
    pub fn spawn(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<Viewport>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Viewport>();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(mut latest) = rx.recv().await {
                loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(viewport) => {
                                trace!(zoom = viewport.zoom, "Viewport update coalesced");
                                latest = viewport;
                            }
                            None => {
                                let _ = out_tx.send(latest);
                                return;
                            }
                        },
                        _ = tokio::time::sleep(quiet) => {
                            if out_tx.send(latest).is_err() {
                                return;
                            }
                            break;
                        }
                    }
                }
            }
        });

        (Self { tx }, out_rx)
    }

    /// Returns false once the debouncer has shut down.
    pub fn update(&self, viewport: Viewport) -> bool {
        self.tx.send(viewport).is_ok()
    }
}
