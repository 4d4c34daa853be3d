//! Coordinate reference system transformations.
//!
//! Implements the one projection pair the overlay pipeline needs
//! (CONUS Albers to geographic) from closed-form formulas.

pub mod albers;
pub mod extent;

pub use albers::AlbersEqualArea;
pub use extent::{conus_extent_to_wgs84, reproject_extent};
