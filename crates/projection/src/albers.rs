//! Albers Equal Area Conic projection on an ellipsoid.
//!
//! Flood inundation rasters are published in CONUS Albers (EPSG:5070):
//! - Standard parallels: 29.5°N and 45.5°N
//! - Latitude of origin: 23°N
//! - Central meridian: 96°W
//! - Datum: NAD83 (GRS80 ellipsoid), meters, no false easting/northing
//!
//! Formulas follow Snyder, "Map Projections: A Working Manual" (USGS PP 1395),
//! equations 14-3 through 14-21 and 3-16 for the iterative inverse.
//! NAD83 and WGS84 differ by well under a meter in CONUS, so inverse output
//! is used directly as WGS84.

use std::f64::consts::PI;

/// GRS80 semi-major axis (meters).
pub const GRS80_A: f64 = 6_378_137.0;

/// GRS80 inverse flattening.
pub const GRS80_INV_F: f64 = 298.257_222_101;

const MAX_INVERSE_ITERATIONS: usize = 25;
const INVERSE_TOLERANCE: f64 = 1e-12;

/// Albers Equal Area Conic projection parameters.
#[derive(Debug, Clone)]
pub struct AlbersEqualArea {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub lat1: f64,
    /// Second standard parallel in radians
    pub lat2: f64,
    /// Semi-major axis (meters)
    pub a: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    /// First eccentricity
    e: f64,
    /// Eccentricity squared
    e2: f64,
    /// Cone constant
    n: f64,
    /// Snyder's C
    c: f64,
    /// Radius of the parallel of origin
    rho0: f64,
}

impl AlbersEqualArea {
    /// Create a projection from parameters in degrees.
    ///
    /// # Arguments
    /// * `lat1_deg`, `lat2_deg` - Standard parallels
    /// * `lat0_deg` - Latitude of origin
    /// * `lon0_deg` - Central meridian
    /// * `a` - Ellipsoid semi-major axis (meters)
    /// * `inv_f` - Ellipsoid inverse flattening
    pub fn new(lat1_deg: f64, lat2_deg: f64, lat0_deg: f64, lon0_deg: f64, a: f64, inv_f: f64) -> Self {
        let lat1 = lat1_deg.to_radians();
        let lat2 = lat2_deg.to_radians();
        let lat0 = lat0_deg.to_radians();
        let lon0 = lon0_deg.to_radians();

        let f = 1.0 / inv_f;
        let e2 = f * (2.0 - f);
        let e = e2.sqrt();

        let m1 = m_fn(lat1, e2);
        let m2 = m_fn(lat2, e2);
        let q1 = q_fn(lat1, e, e2);
        let q2 = q_fn(lat2, e, e2);
        let q0 = q_fn(lat0, e, e2);

        let n = if (lat1 - lat2).abs() < 1e-10 {
            // Single standard parallel
            lat1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        let c = m1 * m1 + n * q1;
        let rho0 = a * (c - n * q0).sqrt() / n;

        Self {
            lon0,
            lat0,
            lat1,
            lat2,
            a,
            false_easting: 0.0,
            false_northing: 0.0,
            e,
            e2,
            n,
            c,
            rho0,
        }
    }

    /// NAD83 / CONUS Albers (EPSG:5070).
    pub fn conus() -> Self {
        Self::new(29.5, 45.5, 23.0, -96.0, GRS80_A, GRS80_INV_F)
    }

    /// Geographic (degrees) to projected meters. Returns `(x, y)`.
    pub fn forward(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let dlon = normalize_lon(lon_deg.to_radians() - self.lon0);

        let q = q_fn(lat, self.e, self.e2);
        let rho = self.a * (self.c - self.n * q).max(0.0).sqrt() / self.n;
        let theta = self.n * dlon;

        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;
        (x, y)
    }

    /// Projected meters to geographic degrees. Returns `(lat, lon)`.
    ///
    /// Returns `None` when the point lies outside the projection's domain or
    /// the latitude iteration does not converge.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let x = x - self.false_easting;
        let y = y - self.false_northing;
        let dy = self.rho0 - y;

        let (rho, theta) = if self.n < 0.0 {
            (-(x * x + dy * dy).sqrt(), (-x).atan2(-dy))
        } else {
            ((x * x + dy * dy).sqrt(), x.atan2(dy))
        };

        let q = (self.c - rho * rho * self.n * self.n / (self.a * self.a)) / self.n;
        let lat = self.latitude_from_q(q)?;
        let lon = normalize_lon(self.lon0 + theta / self.n);

        Some((lat.to_degrees(), lon.to_degrees()))
    }

    /// Invert the authalic `q` for latitude (Snyder eq. 3-16).
    fn latitude_from_q(&self, q: f64) -> Option<f64> {
        // q at the poles
        let q_pole = q_fn(PI / 2.0, self.e, self.e2);
        if q.abs() > q_pole + 1e-9 {
            return None;
        }
        if (q.abs() - q_pole).abs() <= 1e-9 {
            return Some(PI / 2.0 * q.signum());
        }

        let mut phi = (q / 2.0).clamp(-1.0, 1.0).asin();
        for _ in 0..MAX_INVERSE_ITERATIONS {
            let sin_phi = phi.sin();
            let cos_phi = phi.cos();
            let one_minus = 1.0 - self.e2 * sin_phi * sin_phi;
            let delta = one_minus * one_minus / (2.0 * cos_phi)
                * (q / (1.0 - self.e2) - sin_phi / one_minus
                    + (1.0 / (2.0 * self.e))
                        * ((1.0 - self.e * sin_phi) / (1.0 + self.e * sin_phi)).ln());
            phi += delta;
            if delta.abs() < INVERSE_TOLERANCE {
                return Some(phi);
            }
        }
        None
    }
}

/// Snyder eq. 14-15.
fn m_fn(phi: f64, e2: f64) -> f64 {
    let s = phi.sin();
    phi.cos() / (1.0 - e2 * s * s).sqrt()
}

/// Snyder eq. 3-12 (authalic q).
fn q_fn(phi: f64, e: f64, e2: f64) -> f64 {
    let s = phi.sin();
    (1.0 - e2) * (s / (1.0 - e2 * s * s) - (1.0 / (2.0 * e)) * ((1.0 - e * s) / (1.0 + e * s)).ln())
}

/// Wrap a longitude in radians to [-π, π].
fn normalize_lon(mut lon: f64) -> f64 {
    while lon > PI {
        lon -= 2.0 * PI;
    }
    while lon < -PI {
        lon += 2.0 * PI;
    }
    lon
}
