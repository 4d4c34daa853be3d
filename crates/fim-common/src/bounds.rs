//! Bounding box types for projected raster extents and map overlays.

use serde::{Deserialize, Serialize};

use crate::error::{FimError, FimResult};

/// Raster extent in the source projected CRS (meters).
///
/// `xmin..xmax` spans easting and `ymin..ymax` spans northing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedExtent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl ProjectedExtent {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Width of the extent in source units.
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height of the extent in source units.
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// The four corners: `(xmin,ymin)`, `(xmax,ymax)`, `(xmin,ymax)`, `(xmax,ymin)`.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.xmin, self.ymin),
            (self.xmax, self.ymax),
            (self.xmin, self.ymax),
            (self.xmax, self.ymin),
        ]
    }

    /// Reject extents that cannot be reprojected.
    pub fn validate(&self) -> FimResult<()> {
        let values = [self.xmin, self.ymin, self.xmax, self.ymax];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(FimError::ReprojectionInput(format!(
                "non-finite extent {:?}",
                self
            )));
        }
        if self.xmin > self.xmax || self.ymin > self.ymax {
            return Err(FimError::ReprojectionInput(format!(
                "inverted extent {:?}",
                self
            )));
        }
        Ok(())
    }
}

/// Geographic (WGS84, degrees) bounds of a map overlay.
///
/// Always satisfies `south_west_lat <= north_east_lat` and
/// `south_west_lng <= north_east_lng` when built through [`GeographicBounds::from_points`]
/// or [`GeographicBounds::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographicBounds {
    pub south_west_lat: f64,
    pub south_west_lng: f64,
    pub north_east_lat: f64,
    pub north_east_lng: f64,
}

impl GeographicBounds {
    /// Build bounds from two arbitrary corners, ordering each axis.
    pub fn new(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> Self {
        Self {
            south_west_lat: lat_a.min(lat_b),
            south_west_lng: lng_a.min(lng_b),
            north_east_lat: lat_a.max(lat_b),
            north_east_lng: lng_a.max(lng_b),
        }
    }

    /// Component-wise min/max over `(lat, lng)` points.
    ///
    /// Returns `None` for an empty iterator or when any coordinate is not finite.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lng = f64::INFINITY;
        let mut max_lng = f64::NEG_INFINITY;
        let mut seen = false;

        for (lat, lng) in points {
            if !lat.is_finite() || !lng.is_finite() {
                return None;
            }
            seen = true;
            min_lat = min_lat.min(lat);
            max_lat = max_lat.max(lat);
            min_lng = min_lng.min(lng);
            max_lng = max_lng.max(lng);
        }

        seen.then_some(Self {
            south_west_lat: min_lat,
            south_west_lng: min_lng,
            north_east_lat: max_lat,
            north_east_lng: max_lng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_orders_axes() {
        let bounds =
            GeographicBounds::from_points([(40.0, -90.0), (38.0, -92.0), (39.0, -91.0)]).unwrap();
        assert_eq!(bounds.south_west_lat, 38.0);
        assert_eq!(bounds.south_west_lng, -92.0);
        assert_eq!(bounds.north_east_lat, 40.0);
        assert_eq!(bounds.north_east_lng, -90.0);
    }

    #[test]
    fn test_extent_validate() {
        assert!(ProjectedExtent::new(0.0, 0.0, 10.0, 10.0).validate().is_ok());
        assert!(ProjectedExtent::new(10.0, 0.0, 0.0, 10.0).validate().is_err());
        assert!(ProjectedExtent::new(f64::NAN, 0.0, 1.0, 1.0).validate().is_err());
    }
}
