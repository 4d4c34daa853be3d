//! Overlay Presenter and the map canvas boundary.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use fim_common::{FimResult, GeographicBounds};
use renderer::{encode_overlay_png, RgbaImage};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::metrics;
use crate::viewport::Viewport;

/// Canvas-assigned identifier of a placed overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverlayId(pub u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An encoded image anchored at geographic bounds.
#[derive(Debug, Clone)]
pub struct ImageOverlay {
    pub png: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub bounds: GeographicBounds,
    pub opacity: f32,
    pub z_index: i32,
    pub source_url: String,
}

/// The interactive map, as far as the pipeline is concerned.
#[async_trait]
pub trait MapCanvas: Send + Sync {
    async fn add_image_overlay(&self, overlay: ImageOverlay) -> FimResult<OverlayId>;

    async fn remove_overlay(&self, id: OverlayId) -> FimResult<()>;

    async fn viewport(&self) -> Viewport;
}

/// A placed overlay and the raster it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayHandle {
    pub id: OverlayId,
    pub source_url: String,
    pub bounds: GeographicBounds,
}

/// Places overlays on a canvas and owns the list of what it placed.
pub struct OverlayPresenter {
    canvas: Arc<dyn MapCanvas>,
    opacity: f32,
    z_index: i32,
    handles: Mutex<Vec<OverlayHandle>>,
}

impl OverlayPresenter {
    pub fn new(canvas: Arc<dyn MapCanvas>, opacity: f32, z_index: i32) -> Self {
        Self {
            canvas,
            opacity,
            z_index,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn canvas(&self) -> &Arc<dyn MapCanvas> {
        &self.canvas
    }

    /// Encode `image` and place it at `bounds`.
    pub async fn present(
        &self,
        image: &RgbaImage,
        bounds: GeographicBounds,
        source_url: &str,
    ) -> FimResult<OverlayHandle> {
        let png = encode_overlay_png(image)?;
        let mut handles = self.handles.lock().await;
        self.place(&mut handles, png, image, bounds, source_url).await
    }

    /// Like [`present`](Self::present), but only if `still_wanted` holds
    /// once the handle list is locked. `Ok(None)` means the overlay was
    /// dropped without touching the canvas.
    ///
    /// [`clear_all`](Self::clear_all) takes the same lock, so an overlay is
    /// either placed before a clear (and removed by it) or checked after.
    pub async fn present_if<F>(
        &self,
        image: &RgbaImage,
        bounds: GeographicBounds,
        source_url: &str,
        still_wanted: F,
    ) -> FimResult<Option<OverlayHandle>>
    where
        F: Fn() -> bool,
    {
        let png = encode_overlay_png(image)?;
        let mut handles = self.handles.lock().await;
        if !still_wanted() {
            return Ok(None);
        }
        self.place(&mut handles, png, image, bounds, source_url)
            .await
            .map(Some)
    }

    async fn place(
        &self,
        handles: &mut Vec<OverlayHandle>,
        png: Vec<u8>,
        image: &RgbaImage,
        bounds: GeographicBounds,
        source_url: &str,
    ) -> FimResult<OverlayHandle> {
        let id = self
            .canvas
            .add_image_overlay(ImageOverlay {
                png,
                width: image.width,
                height: image.height,
                bounds,
                opacity: self.opacity,
                z_index: self.z_index,
                source_url: source_url.to_string(),
            })
            .await?;

        let handle = OverlayHandle {
            id,
            source_url: source_url.to_string(),
            bounds,
        };
        handles.push(handle.clone());
        metrics::record_overlay_presented();
        debug!(overlay_id = %id, url = source_url, "Overlay presented");
        Ok(handle)
    }

    /// Remove every tracked overlay. Idempotent; returns how many were
    /// tracked. A canvas that fails to remove one is logged and skipped.
    pub async fn clear_all(&self) -> usize {
        let drained: Vec<OverlayHandle> = std::mem::take(&mut *self.handles.lock().await);
        for handle in &drained {
            if let Err(e) = self.canvas.remove_overlay(handle.id).await {
                warn!(overlay_id = %handle.id, error = %e, "Failed to remove overlay");
            }
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "Cleared overlays");
        }
        drained.len()
    }

    pub async fn handles(&self) -> Vec<OverlayHandle> {
        self.handles.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.handles.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handles.lock().await.is_empty()
    }
}

/// In-memory canvas that records overlays; useful as a headless map.
#[derive(Debug)]
pub struct MemoryCanvas {
    state: Mutex<MemoryCanvasState>,
    viewport: Viewport,
}

#[derive(Debug, Default)]
struct MemoryCanvasState {
    next_id: u64,
    overlays: Vec<(OverlayId, ImageOverlay)>,
}

impl MemoryCanvas {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            state: Mutex::new(MemoryCanvasState::default()),
            viewport,
        }
    }

    /// Overlays currently on the canvas, in insertion order.
    pub async fn overlays(&self) -> Vec<(OverlayId, ImageOverlay)> {
        self.state.lock().await.overlays.clone()
    }

    pub async fn overlay_count(&self) -> usize {
        self.state.lock().await.overlays.len()
    }
}

#[async_trait]
impl MapCanvas for MemoryCanvas {
    async fn add_image_overlay(&self, overlay: ImageOverlay) -> FimResult<OverlayId> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = OverlayId(state.next_id);
        state.overlays.push((id, overlay));
        Ok(id)
    }

    async fn remove_overlay(&self, id: OverlayId) -> FimResult<()> {
        self.state.lock().await.overlays.retain(|(oid, _)| *oid != id);
        Ok(())
    }

    async fn viewport(&self) -> Viewport {
        self.viewport
    }
}
