//! Error types for GeoTIFF decoding.

use fim_common::FimError;
use thiserror::Error;

/// Result type for COG decoding operations.
pub type CogResult<T> = Result<T, CogError>;

/// Error types for COG decoding.
#[derive(Error, Debug)]
pub enum CogError {
    /// The byte buffer is not a readable TIFF
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Neither a tiepoint/pixel-scale pair nor a transformation matrix is present
    #[error("Missing georeference: {0}")]
    MissingGeoreference(String),

    /// Valid TIFF, but a layout the overlay pipeline cannot place
    #[error("Unsupported raster layout: {0}")]
    UnsupportedLayout(String),

    #[error("Raster has no pixels")]
    EmptyRaster,
}

impl From<CogError> for FimError {
    fn from(err: CogError) -> Self {
        FimError::Decode(err.to_string())
    }
}
