//! Rasterization of decoded inundation grids into RGBA overlays.
//!
//! Every pixel of band 0 is classified as missing (NaN or the no-data
//! sentinel) or present. Missing pixels are fully transparent. Present
//! pixels get the inundation color with an alpha chosen by [`RenderMode`].

use std::fmt;
use std::str::FromStr;

use fim_common::DecodedRaster;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Rows per parallel work unit.
const ROWS_PER_TASK: usize = 64;

/// How present pixel values map to alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Only `value == 1` is inundated, drawn with a fixed alpha.
    Binary,
    /// Alpha scales linearly between a floor and ceiling over the raster's
    /// present value range.
    Normalized,
    /// Binary when any present pixel is exactly 1, otherwise normalized.
    #[default]
    Auto,
}

impl RenderMode {
    /// Resolve `Auto` against a concrete raster.
    pub fn resolve(self, raster: &DecodedRaster) -> RenderMode {
        match self {
            RenderMode::Auto => {
                let has_flag = raster
                    .primary_band()
                    .iter()
                    .any(|v| *v == 1.0 && !raster.is_missing(*v));
                if has_flag {
                    RenderMode::Binary
                } else {
                    RenderMode::Normalized
                }
            }
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::Binary => "binary",
            RenderMode::Normalized => "normalized",
            RenderMode::Auto => "auto",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(RenderMode::Binary),
            "normalized" | "normalised" => Ok(RenderMode::Normalized),
            "auto" => Ok(RenderMode::Auto),
            other => Err(format!(
                "unknown render mode '{}', expected binary, normalized or auto",
                other
            )),
        }
    }
}

/// Colors and alpha levels for inundated pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub color: [u8; 3],
    pub binary_alpha: u8,
    pub alpha_floor: u8,
    pub alpha_ceiling: u8,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: [0, 100, 255],
            binary_alpha: 180,
            alpha_floor: 55,
            alpha_ceiling: 255,
        }
    }
}

/// An RGBA8 image, row-major, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Alpha channel in pixel order.
    pub fn alpha(&self) -> Vec<u8> {
        self.pixels.chunks_exact(4).map(|p| p[3]).collect()
    }

    /// Number of pixels with non-zero alpha.
    pub fn visible_pixels(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[3] > 0).count()
    }
}

/// Rasterize with the default inundation style.
pub fn rasterize(raster: &DecodedRaster, mode: RenderMode) -> RgbaImage {
    rasterize_with_style(raster, mode, &OverlayStyle::default())
}

/// Rasterize band 0 of `raster` into an RGBA image of the same size.
pub fn rasterize_with_style(
    raster: &DecodedRaster,
    mode: RenderMode,
    style: &OverlayStyle,
) -> RgbaImage {
    let width = raster.width();
    let height = raster.height();
    let values = raster.primary_band();

    let resolved = mode.resolve(raster);
    let shade = match resolved {
        RenderMode::Normalized => Shade::Normalized(raster.present_range()),
        _ => Shade::Binary,
    };

    let mut pixels = vec![0u8; width * height * 4];
    pixels
        .par_chunks_mut(width * 4 * ROWS_PER_TASK)
        .zip(values.par_chunks(width * ROWS_PER_TASK))
        .for_each(|(out, row_values)| {
            for (px, value) in out.chunks_exact_mut(4).zip(row_values) {
                if raster.is_missing(*value) {
                    continue;
                }
                let alpha = shade.alpha(*value, style);
                if alpha > 0 {
                    px[0] = style.color[0];
                    px[1] = style.color[1];
                    px[2] = style.color[2];
                    px[3] = alpha;
                }
            }
        });

    tracing::debug!(width, height, mode = %resolved, "Rasterized overlay");

    RgbaImage {
        width,
        height,
        pixels,
    }
}

enum Shade {
    Binary,
    Normalized(Option<(f32, f32)>),
}

impl Shade {
    fn alpha(&self, value: f32, style: &OverlayStyle) -> u8 {
        match *self {
            Shade::Binary => {
                if value == 1.0 {
                    style.binary_alpha
                } else {
                    0
                }
            }
            Shade::Normalized(None) => 0,
            Shade::Normalized(Some((min, max))) => {
                if max <= min {
                    return style.alpha_ceiling;
                }
                let t = ((value - min) / (max - min)).clamp(0.0, 1.0) as f64;
                let span = style.alpha_ceiling.saturating_sub(style.alpha_floor) as f64;
                (style.alpha_floor as f64 + (t * span).round()) as u8
            }
        }
    }
}
