//! Test data generators for synthetic inundation rasters.
//!
//! These generators create predictable, verifiable test data patterns
//! and encode them as GeoTIFFs the way a map service would serve them.

use std::io::Cursor;

use fim_common::ProjectedExtent;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

/// Creates a binary inundation mask: a flooded channel down the middle
/// column band, dry elsewhere.
pub fn create_binary_mask(width: usize, height: usize) -> Vec<f32> {
    let lo = width / 3;
    let hi = width - width / 3;
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(if col >= lo && col < hi { 1.0 } else { 0.0 });
        }
    }
    data
}

/// Creates a depth-like grid in meters, deepest at the center.
pub fn create_depth_grid(width: usize, height: usize, max_depth: f32) -> Vec<f32> {
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt().max(1.0);
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 - cx;
            let dy = row as f32 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            data.push(max_depth * (1.0 - dist / max_dist));
        }
    }
    data
}

/// How a built GeoTIFF places its pixels in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Georeference {
    /// ModelPixelScale + ModelTiepoint, the layout GDAL writes for north-up COGs.
    TiePoint,
    /// A 4x4 ModelTransformation matrix.
    Transformation,
    /// No georeferencing tags at all.
    None,
}

/// Builder for small single-band GeoTIFFs.
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    width: usize,
    height: usize,
    data: Vec<f32>,
    extent: ProjectedExtent,
    no_data: Option<String>,
    georeference: Georeference,
}

impl GeoTiffBuilder {
    pub fn new(width: usize, height: usize, data: Vec<f32>, extent: ProjectedExtent) -> Self {
        assert_eq!(data.len(), width * height, "data does not match dimensions");
        Self {
            width,
            height,
            data,
            extent,
            no_data: None,
            georeference: Georeference::TiePoint,
        }
    }

    /// Build from nested rows, top row first.
    pub fn from_rows(rows: &[Vec<f32>], extent: ProjectedExtent) -> Self {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let data = rows.iter().flatten().copied().collect();
        Self::new(width, height, data, extent)
    }

    /// GDAL_NODATA tag text, e.g. `"-9999"` or `"nan"`.
    pub fn no_data(mut self, value: impl Into<String>) -> Self {
        self.no_data = Some(value.into());
        self
    }

    pub fn georeference(mut self, georeference: Georeference) -> Self {
        self.georeference = georeference;
        self
    }

    /// Encode as 32-bit float samples.
    pub fn build(&self) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buf).expect("tiff encoder");
            let mut image = encoder
                .new_image::<colortype::Gray32Float>(self.width as u32, self.height as u32)
                .expect("tiff image");
            self.write_geo_tags(image.encoder());
            image.write_data(&self.data).expect("tiff data");
        }
        buf.into_inner()
    }

    /// Encode as 8-bit unsigned samples, truncating each value.
    pub fn build_u8(&self) -> Vec<u8> {
        let samples: Vec<u8> = self.data.iter().map(|v| *v as u8).collect();
        let mut buf = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buf).expect("tiff encoder");
            let mut image = encoder
                .new_image::<colortype::Gray8>(self.width as u32, self.height as u32)
                .expect("tiff image");
            self.write_geo_tags(image.encoder());
            image.write_data(&samples).expect("tiff data");
        }
        buf.into_inner()
    }

    fn write_geo_tags<W, K>(&self, dir: &mut tiff::encoder::DirectoryEncoder<'_, W, K>)
    where
        W: std::io::Write + std::io::Seek,
        K: tiff::encoder::TiffKind,
    {
        let scale_x = self.extent.width() / self.width as f64;
        let scale_y = self.extent.height() / self.height as f64;

        match self.georeference {
            Georeference::TiePoint => {
                let scale = [scale_x, scale_y, 0.0];
                let tie = [0.0, 0.0, 0.0, self.extent.xmin, self.extent.ymax, 0.0];
                dir.write_tag(Tag::ModelPixelScaleTag, &scale[..])
                    .expect("pixel scale tag");
                dir.write_tag(Tag::ModelTiepointTag, &tie[..])
                    .expect("tiepoint tag");
            }
            Georeference::Transformation => {
                let matrix = [
                    scale_x, 0.0, 0.0, self.extent.xmin,
                    0.0, -scale_y, 0.0, self.extent.ymax,
                    0.0, 0.0, 0.0, 0.0,
                    0.0, 0.0, 0.0, 1.0,
                ];
                dir.write_tag(Tag::ModelTransformationTag, &matrix[..])
                    .expect("transformation tag");
            }
            Georeference::None => {}
        }

        if let Some(no_data) = &self.no_data {
            dir.write_tag(Tag::GdalNodata, no_data.as_str())
                .expect("nodata tag");
        }
    }
}

/// A georeferenced 8-bit GeoTIFF that declares `width` x `height` pixels
/// but carries only a few bytes of strip data.
///
/// Decoding it has to refuse the declared size rather than allocate it.
pub fn oversized_geotiff(width: u32, height: u32) -> Vec<u8> {
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    const DOUBLE: u16 = 12;
    const ENTRIES: u32 = 13;

    let ifd_end = 8 + 2 + ENTRIES * 12 + 4;
    let scale_offset = ifd_end;
    let tiepoint_offset = scale_offset + 3 * 8;
    let strip_offset = tiepoint_offset + 6 * 8;
    let declared_bytes = width.saturating_mul(height);

    let entries: [(u16, u16, u32, u32); ENTRIES as usize] = [
        (256, LONG, 1, width),
        (257, LONG, 1, height),
        (258, SHORT, 1, 8),
        (259, SHORT, 1, 1),
        (262, SHORT, 1, 1),
        (273, LONG, 1, strip_offset),
        (277, SHORT, 1, 1),
        (278, LONG, 1, height),
        (279, LONG, 1, declared_bytes),
        (284, SHORT, 1, 1),
        (339, SHORT, 1, 1),
        (33550, DOUBLE, 3, scale_offset),
        (33922, DOUBLE, 6, tiepoint_offset),
    ];

    let mut out = Vec::with_capacity(strip_offset as usize + 16);
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());

    out.extend_from_slice(&(ENTRIES as u16).to_le_bytes());
    for (tag, kind, count, value) in entries {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }
    out.extend_from_slice(&0u32.to_le_bytes());

    for v in [10.0f64, 10.0, 0.0] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for v in [0.0f64, 0.0, 0.0, 0.0, 1_000_000.0, 0.0] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    debug_assert_eq!(out.len(), strip_offset as usize);

    out.extend_from_slice(&[0u8; 16]);
    out
}
