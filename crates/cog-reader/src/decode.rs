//! GeoTIFF bytes to [`DecodedRaster`].

use std::io::Cursor;

use fim_common::DecodedRaster;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{CogError, CogResult};
use crate::georef::{parse_no_data, GeoTransform};

/// Largest sample buffer [`decode`] will allocate for one image.
pub const DEFAULT_MAX_DECODE_BYTES: usize = 256 * 1024 * 1024;

/// Decode a full GeoTIFF / COG payload.
///
/// Only the first (full resolution) image is read; COG overviews are
/// ignored. Interleaved samples are split into bands and rows are
/// reordered north-up when the file is stored south-up.
pub fn decode(bytes: &[u8]) -> CogResult<DecodedRaster> {
    decode_with_limit(bytes, DEFAULT_MAX_DECODE_BYTES)
}

/// [`decode`] with an explicit cap on the decoded sample buffer.
///
/// An image whose declared dimensions need more than `max_buffer_bytes`
/// fails with [`CogError::Tiff`] before anything is allocated.
pub fn decode_with_limit(bytes: &[u8], max_buffer_bytes: usize) -> CogResult<DecodedRaster> {
    let mut limits = Limits::default();
    limits.decoding_buffer_size = max_buffer_bytes;
    let mut decoder = Decoder::new(Cursor::new(bytes))?.with_limits(limits);

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return Err(CogError::EmptyRaster);
    }

    let pixel_scale = read_f64_tag(&mut decoder, Tag::ModelPixelScaleTag)?;
    let tiepoint = read_f64_tag(&mut decoder, Tag::ModelTiepointTag)?;
    let transformation = read_f64_tag(&mut decoder, Tag::ModelTransformationTag)?;
    let transform = GeoTransform::from_tags(
        pixel_scale.as_deref(),
        tiepoint.as_deref(),
        transformation.as_deref(),
    )?;

    let no_data = match decoder.find_tag(Tag::GdalNodata)? {
        Some(value) => parse_no_data(&value.into_string()?),
        None => None,
    };

    let samples = samples_to_f32(decoder.read_image()?)?;
    let mut bands = split_bands(samples, width, height)?;
    if transform.is_south_up() {
        for band in &mut bands {
            flip_rows(band, width);
        }
    }

    debug!(
        width = width,
        height = height,
        bands = bands.len(),
        no_data = ?no_data,
        "Decoded GeoTIFF"
    );

    DecodedRaster::new(width, height, bands, no_data, transform.extent(width, height))
        .map_err(|e| CogError::UnsupportedLayout(e.to_string()))
}

fn read_f64_tag<R>(decoder: &mut Decoder<R>, tag: Tag) -> CogResult<Option<Vec<f64>>>
where
    R: std::io::Read + std::io::Seek,
{
    match decoder.find_tag(tag)? {
        Some(value) => Ok(Some(value.into_f64_vec()?)),
        None => Ok(None),
    }
}

fn samples_to_f32(result: DecodingResult) -> CogResult<Vec<f32>> {
    let samples = match result {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|s| s as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|s| s as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|s| s as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|s| s as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|s| s as f32).collect(),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(CogError::UnsupportedLayout(
                "unsupported sample format".to_string(),
            ))
        }
    };
    Ok(samples)
}

/// Split pixel-interleaved samples into per-band grids.
fn split_bands(samples: Vec<f32>, width: usize, height: usize) -> CogResult<Vec<Vec<f32>>> {
    let pixels = width * height;
    if samples.is_empty() || samples.len() % pixels != 0 {
        return Err(CogError::UnsupportedLayout(format!(
            "{} samples for {}x{} pixels",
            samples.len(),
            width,
            height
        )));
    }

    let per_pixel = samples.len() / pixels;
    if per_pixel == 1 {
        return Ok(vec![samples]);
    }

    let mut bands = vec![Vec::with_capacity(pixels); per_pixel];
    for pixel in samples.chunks_exact(per_pixel) {
        for (band, value) in bands.iter_mut().zip(pixel) {
            band.push(*value);
        }
    }
    Ok(bands)
}

fn flip_rows(band: &mut [f32], width: usize) {
    let height = band.len() / width;
    for row in 0..height / 2 {
        let (top, bottom) = band.split_at_mut((height - 1 - row) * width);
        top[row * width..(row + 1) * width].swap_with_slice(&mut bottom[..width]);
    }
}
