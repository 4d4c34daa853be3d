//! Cloud-Optimized GeoTIFF decoding.
//!
//! Turns a fetched COG payload into a [`fim_common::DecodedRaster`]:
//! band grids, the GDAL no-data sentinel and the model-space extent
//! (EPSG:5070 meters for the inundation rasters).
//!
//! TIFF container parsing is delegated to the `tiff` crate; this crate
//! reads the GeoTIFF tags on top of it.

pub mod decode;
pub mod error;
pub mod georef;

pub use decode::{decode, decode_with_limit, DEFAULT_MAX_DECODE_BYTES};
pub use error::{CogError, CogResult};
pub use georef::GeoTransform;
