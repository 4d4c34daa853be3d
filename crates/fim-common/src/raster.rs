//! Decoded single- or multi-band rasters in a projected CRS.

use crate::bounds::ProjectedExtent;
use crate::error::{FimError, FimResult};

/// A decoded raster grid.
///
/// Bands are stored row-major (`row * width + col`), row 0 at the top
/// (northern edge). Values are immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRaster {
    width: usize,
    height: usize,
    bands: Vec<Vec<f32>>,
    no_data: Option<f32>,
    extent: ProjectedExtent,
}

impl DecodedRaster {
    /// Build a raster, checking every band holds `width * height` values.
    pub fn new(
        width: usize,
        height: usize,
        bands: Vec<Vec<f32>>,
        no_data: Option<f32>,
        extent: ProjectedExtent,
    ) -> FimResult<Self> {
        if width == 0 || height == 0 {
            return Err(FimError::Decode(format!("empty raster {}x{}", width, height)));
        }
        if bands.is_empty() {
            return Err(FimError::Decode("raster has no bands".to_string()));
        }
        let expected = width * height;
        if let Some((i, band)) = bands.iter().enumerate().find(|(_, b)| b.len() != expected) {
            return Err(FimError::Decode(format!(
                "band {} has {} values, expected {}",
                i,
                band.len(),
                expected
            )));
        }

        Ok(Self {
            width,
            height,
            bands,
            no_data,
            extent,
        })
    }

    /// Build a one-band raster from nested rows.
    pub fn from_rows(
        rows: &[Vec<f32>],
        no_data: Option<f32>,
        extent: ProjectedExtent,
    ) -> FimResult<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|r| r.len() != width) {
            return Err(FimError::Decode("ragged raster rows".to_string()));
        }
        let band = rows.iter().flatten().copied().collect();
        Self::new(width, height, vec![band], no_data, extent)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn no_data(&self) -> Option<f32> {
        self.no_data
    }

    pub fn extent(&self) -> &ProjectedExtent {
        &self.extent
    }

    /// Band 0, the band overlays are rendered from.
    pub fn primary_band(&self) -> &[f32] {
        &self.bands[0]
    }

    /// Band-0 value at `(row, col)`.
    pub fn value(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.bands[0][row * self.width + col])
    }

    /// NaN or equal to the no-data sentinel.
    pub fn is_missing(&self, value: f32) -> bool {
        value.is_nan() || self.no_data.is_some_and(|nd| value == nd)
    }

    /// Min/max over present band-0 values, `None` if every pixel is missing.
    pub fn present_range(&self) -> Option<(f32, f32)> {
        self.primary_band()
            .iter()
            .copied()
            .filter(|v| !self.is_missing(*v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
