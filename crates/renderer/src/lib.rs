//! Overlay rendering for flood inundation rasters.
//!
//! - [`rasterize`]: band-0 values to a translucent RGBA image
//! - [`png`]: RGBA to PNG (indexed when the palette fits)

pub mod error;
pub mod png;
pub mod rasterize;

pub use error::{RenderError, RenderResult};
pub use png::encode_overlay_png;
pub use rasterize::{rasterize, rasterize_with_style, OverlayStyle, RenderMode, RgbaImage};
