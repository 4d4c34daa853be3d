//! Common test fixtures for fim-viewer tests.
//!
//! Pre-defined extents, catalogs, features and quantile payloads that
//! mirror what the flood map services return.

use fim_common::ProjectedExtent;
use serde_json::{json, Value};

/// Common EPSG:5070 extents for testing.
pub mod extent {
    use super::ProjectedExtent;

    /// A 200 km square south of the Albers origin latitude band.
    pub fn reference() -> ProjectedExtent {
        ProjectedExtent::new(-100_000.0, 1_000_000.0, 100_000.0, 1_200_000.0)
    }

    /// A reach-sized extent (about 2 km) in the Missouri Ozarks.
    pub fn ozarks_reach() -> ProjectedExtent {
        ProjectedExtent::new(372_000.0, 1_480_000.0, 374_000.0, 1_482_000.0)
    }

    /// Tiny extent for pixel-level tests.
    pub fn unit() -> ProjectedExtent {
        ProjectedExtent::new(0.0, 0.0, 20.0, 20.0)
    }
}

/// Catalog payloads as served by the inundation API.
pub mod catalog {
    use super::{json, Value};

    /// Two single-file stages.
    pub fn two_stage() -> Value {
        json!({
            "files": ["a.tif", "b.tif"],
            "flows_cms": [10.0, 20.0],
            "stages_m": [1.0, 2.0]
        })
    }

    /// Stage 2.0 matches index 1 and the group that lists it.
    pub fn with_group() -> Value {
        json!({
            "files": ["a.tif", "b.tif", ["c.tif", 2.0, 3.0]],
            "flows_cms": [10.0, 20.0, 30.0],
            "stages_m": [1.0, 2.0, 3.0]
        })
    }

    /// A catalog whose files are absolute URLs on `base`.
    pub fn hosted(base: &str) -> Value {
        json!({
            "files": [format!("{}/cogs/a.tif", base), format!("{}/cogs/b.tif", base)],
            "flows_cms": [10.0, 20.0],
            "stages_m": [1.0, 2.0]
        })
    }
}

/// Reach feature attribute maps.
pub mod feature {
    use super::{json, Value};

    pub fn comid(comid: i64, name: &str) -> Value {
        json!({ "COMID": comid, "river_name": name })
    }

    pub fn reach_id(reach_id: &str) -> Value {
        json!({ "reach_id": reach_id, "river_name": "NODATA" })
    }

    pub fn anonymous() -> Value {
        json!({ "river_name": "Roaring River" })
    }
}

/// Quantile payloads as served by the quantiles endpoint.
pub mod quantiles {
    use super::{json, Value};

    /// Three day-of-year records, one with a null and one invalid day.
    pub fn sample() -> Value {
        json!([
            { "doy": 1, "q0": 0.5, "q10": 1.0, "q25": 2.0, "q75": 5.0, "q90": 8.0 },
            { "doy": 32, "q0": 0.6, "q10": null, "q25": 2.5, "q75": 5.5, "q90": 9.0 },
            { "doy": 400, "q0": 1.0, "q10": 1.0, "q25": 1.0, "q75": 1.0, "q90": 1.0 }
        ])
    }
}
