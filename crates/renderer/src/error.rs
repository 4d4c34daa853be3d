//! Error types for overlay rendering.

use fim_common::FimError;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("pixel buffer has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("cannot encode an empty {width}x{height} image")]
    EmptyImage { width: usize, height: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] std::io::Error),
}

impl From<RenderError> for FimError {
    fn from(err: RenderError) -> Self {
        FimError::Render(err.to_string())
    }
}
