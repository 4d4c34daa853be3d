//! Reprojection of raster extents to geographic overlay bounds.

use fim_common::{FimError, FimResult, GeographicBounds, ProjectedExtent};

use crate::albers::AlbersEqualArea;

/// Reproject a projected extent to WGS84 bounds.
///
/// All four corners are inverted independently and reduced with min/max,
/// since the conic projection rotates meridians away from the central one
/// and a two-corner transform can clip or invert the box.
pub fn reproject_extent(
    proj: &AlbersEqualArea,
    extent: &ProjectedExtent,
) -> FimResult<GeographicBounds> {
    extent.validate()?;

    let mut points = Vec::with_capacity(4);
    for (x, y) in extent.corners() {
        let point = proj.inverse(x, y).ok_or_else(|| {
            FimError::ReprojectionInput(format!("corner ({}, {}) outside projection domain", x, y))
        })?;
        points.push(point);
    }

    GeographicBounds::from_points(points)
        .ok_or_else(|| FimError::ReprojectionInput(format!("no finite corners for {:?}", extent)))
}

/// Reproject an EPSG:5070 extent to WGS84 bounds.
pub fn conus_extent_to_wgs84(extent: &ProjectedExtent) -> FimResult<GeographicBounds> {
    reproject_extent(&AlbersEqualArea::conus(), extent)
}
