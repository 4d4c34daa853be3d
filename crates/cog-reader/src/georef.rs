//! GeoTIFF model-space georeferencing.
//!
//! Supports the two north-up encodings GDAL writes: a ModelPixelScale +
//! ModelTiepoint pair, or a ModelTransformation matrix without rotation.

use fim_common::ProjectedExtent;

use crate::error::{CogError, CogResult};

/// Affine mapping from pixel (col, row) to model (x, y).
///
/// `x = origin_x + col * pixel_width`, `y = origin_y + row * pixel_height`.
/// `pixel_height` is negative for the usual north-up layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from raw tag values. The transformation matrix wins when both
    /// encodings are present.
    pub fn from_tags(
        pixel_scale: Option<&[f64]>,
        tiepoint: Option<&[f64]>,
        transformation: Option<&[f64]>,
    ) -> CogResult<Self> {
        if let Some(m) = transformation {
            return Self::from_matrix(m);
        }

        match (pixel_scale, tiepoint) {
            (Some(scale), Some(tie)) => Self::from_tiepoint(scale, tie),
            (None, Some(_)) => Err(CogError::MissingGeoreference(
                "tiepoint without pixel scale".to_string(),
            )),
            (Some(_), None) => Err(CogError::MissingGeoreference(
                "pixel scale without tiepoint".to_string(),
            )),
            (None, None) => Err(CogError::MissingGeoreference(
                "no ModelTiepoint or ModelTransformation tag".to_string(),
            )),
        }
    }

    fn from_tiepoint(scale: &[f64], tie: &[f64]) -> CogResult<Self> {
        if scale.len() < 2 || tie.len() < 6 {
            return Err(CogError::MissingGeoreference(format!(
                "short pixel scale ({}) or tiepoint ({})",
                scale.len(),
                tie.len()
            )));
        }
        if tie.len() > 6 {
            return Err(CogError::UnsupportedLayout(format!(
                "{} tiepoints; only a single tiepoint is supported",
                tie.len() / 6
            )));
        }

        let (i, j) = (tie[0], tie[1]);
        let (x, y) = (tie[3], tie[4]);
        let (sx, sy) = (scale[0], scale[1]);

        Self {
            origin_x: x - i * sx,
            origin_y: y + j * sy,
            pixel_width: sx,
            pixel_height: -sy,
        }
        .checked()
    }

    fn from_matrix(m: &[f64]) -> CogResult<Self> {
        if m.len() < 16 {
            return Err(CogError::MissingGeoreference(format!(
                "transformation matrix has {} values",
                m.len()
            )));
        }
        if m[1] != 0.0 || m[4] != 0.0 {
            return Err(CogError::UnsupportedLayout(
                "rotated transformation matrix".to_string(),
            ));
        }

        Self {
            origin_x: m[3],
            origin_y: m[7],
            pixel_width: m[0],
            pixel_height: m[5],
        }
        .checked()
    }

    fn checked(self) -> CogResult<Self> {
        let values = [
            self.origin_x,
            self.origin_y,
            self.pixel_width,
            self.pixel_height,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CogError::MissingGeoreference(format!(
                "non-finite georeference {:?}",
                self
            )));
        }
        if self.pixel_width == 0.0 || self.pixel_height == 0.0 {
            return Err(CogError::UnsupportedLayout("zero pixel size".to_string()));
        }
        Ok(self)
    }

    /// Outer-edge extent of a `width` x `height` grid.
    pub fn extent(&self, width: usize, height: usize) -> ProjectedExtent {
        let x0 = self.origin_x;
        let x1 = self.origin_x + self.pixel_width * width as f64;
        let y0 = self.origin_y;
        let y1 = self.origin_y + self.pixel_height * height as f64;
        ProjectedExtent::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// True when row 0 is the southern edge.
    pub fn is_south_up(&self) -> bool {
        self.pixel_height > 0.0
    }
}

/// Parse the GDAL_NODATA ASCII tag. GDAL writes it NUL-terminated.
pub fn parse_no_data(text: &str) -> Option<f32> {
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    trimmed.parse::<f64>().ok().map(|v| v as f32)
}
