//! A map canvas that writes each overlay to disk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use fim_common::{FimError, FimResult, GeographicBounds};
use fim_pipeline::{ImageOverlay, MapCanvas, OverlayId, Viewport};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Placement metadata written next to each PNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySidecar {
    pub id: OverlayId,
    pub width: usize,
    pub height: usize,
    pub bounds: GeographicBounds,
    pub opacity: f32,
    pub z_index: i32,
    pub source_url: String,
}

/// Writes `overlay-<n>.png` and `overlay-<n>.json` into a directory.
pub struct FileCanvas {
    dir: PathBuf,
    next_id: AtomicU64,
    viewport: Viewport,
}

impl FileCanvas {
    pub async fn create(dir: impl Into<PathBuf>, viewport: Viewport) -> FimResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            next_id: AtomicU64::new(0),
            viewport,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn png_path(&self, id: OverlayId) -> PathBuf {
        self.dir.join(format!("overlay-{}.png", id))
    }

    pub fn sidecar_path(&self, id: OverlayId) -> PathBuf {
        self.dir.join(format!("overlay-{}.json", id))
    }
}

#[async_trait]
impl MapCanvas for FileCanvas {
    async fn add_image_overlay(&self, overlay: ImageOverlay) -> FimResult<OverlayId> {
        let id = OverlayId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);

        let sidecar = OverlaySidecar {
            id,
            width: overlay.width,
            height: overlay.height,
            bounds: overlay.bounds,
            opacity: overlay.opacity,
            z_index: overlay.z_index,
            source_url: overlay.source_url,
        };
        let json = serde_json::to_vec_pretty(&sidecar)
            .map_err(|e| FimError::Internal(format!("Encoding overlay sidecar: {}", e)))?;

        tokio::fs::write(self.png_path(id), &overlay.png).await?;
        tokio::fs::write(self.sidecar_path(id), json).await?;
        debug!(overlay_id = %id, dir = %self.dir.display(), "Wrote overlay");
        Ok(id)
    }

    async fn remove_overlay(&self, id: OverlayId) -> FimResult<()> {
        for path in [self.png_path(id), self.sidecar_path(id)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(FimError::Internal(format!(
                        "Failed to remove {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
        Ok(())
    }

    async fn viewport(&self) -> Viewport {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            zoom: 11.0,
            bounds: GeographicBounds::new(36.0, -93.0, 37.0, -91.0),
        }
    }

    fn overlay() -> ImageOverlay {
        ImageOverlay {
            png: b"\x89PNG fake".to_vec(),
            width: 4,
            height: 2,
            bounds: GeographicBounds::new(36.5, -92.0, 36.6, -91.9),
            opacity: 0.8,
            z_index: 1000,
            source_url: "https://example.org/a.tif".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_writes_png_and_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        let canvas = FileCanvas::create(tmp.path().join("out"), viewport()).await.unwrap();

        let id = canvas.add_image_overlay(overlay()).await.unwrap();
        assert_eq!(id, OverlayId(1));

        let png = std::fs::read(canvas.png_path(id)).unwrap();
        assert_eq!(png, b"\x89PNG fake");

        let sidecar: OverlaySidecar =
            serde_json::from_slice(&std::fs::read(canvas.sidecar_path(id)).unwrap()).unwrap();
        assert_eq!(sidecar.width, 4);
        assert_eq!(sidecar.z_index, 1000);
        assert_eq!(sidecar.source_url, "https://example.org/a.tif");
    }

    #[tokio::test]
    async fn test_remove_deletes_both_files() {
        let tmp = tempfile::tempdir().unwrap();
        let canvas = FileCanvas::create(tmp.path(), viewport()).await.unwrap();

        let id = canvas.add_image_overlay(overlay()).await.unwrap();
        canvas.remove_overlay(id).await.unwrap();

        assert!(!canvas.png_path(id).exists());
        assert!(!canvas.sidecar_path(id).exists());
        // Already gone
        canvas.remove_overlay(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let tmp = tempfile::tempdir().unwrap();
        let canvas = FileCanvas::create(tmp.path(), viewport()).await.unwrap();

        let a = canvas.add_image_overlay(overlay()).await.unwrap();
        let b = canvas.add_image_overlay(overlay()).await.unwrap();
        assert_eq!((a, b), (OverlayId(1), OverlayId(2)));
        assert_eq!(canvas.viewport().await.zoom, 11.0);
    }
}
