//! Common types and utilities shared across the flood inundation map crates.

pub mod bounds;
pub mod catalog;
pub mod error;
pub mod quantiles;
pub mod raster;
pub mod reach;

pub use bounds::{GeographicBounds, ProjectedExtent};
pub use catalog::{FileEntry, GroupMember, ReachCatalog, StageSelection};
pub use error::{FimError, FimResult};
pub use quantiles::{Quantile, QuantilePoint, QuantileRecord, QuantileSeries};
pub use raster::DecodedRaster;
pub use reach::{ReachFeature, ReachId, REACH_ID_ATTRIBUTES};
