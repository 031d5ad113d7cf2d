//! Transverse Mercator projection on the WGS84 ellipsoid
//!
//! Krüger series to third order in the third flattening `n`, which keeps
//! errors well below a millimetre inside a UTM zone.
//!
//! ```text
//! forward:  t  = sinh(atanh(sinφ) − e·atanh(e·sinφ))
//!           ξ' = atan2(t, cos Δλ),  η' = atanh(sin Δλ / sqrt(1 + t²))
//!           E  = E0 + k0·A·(η' + Σ αj·cos 2jξ'·sinh 2jη')
//!           N  = N0 + k0·A·(ξ' + Σ αj·sin 2jξ'·cosh 2jη')
//! inverse:  ξ' = ξ − Σ βj·sin 2jξ·cosh 2jη,  η' = η − Σ βj·cos 2jξ·sinh 2jη
//!           χ  = asin(sin ξ' / cosh η'),     φ = χ + Σ δj·sin 2jχ
//!           λ  = λ0 + atan2(sinh η', cos ξ')
//! ```
//!
//! # References
//!
//! - Karney, C.F.F. (2011). "Transverse Mercator with an accuracy of a few
//!   nanometers." J. Geodesy, 85(8), 475-485.

use crate::error::CrsError;

/// WGS84 semi-major axis (m).
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// UTM central scale factor.
pub const UTM_K0: f64 = 0.9996;
/// UTM false easting (m).
pub const UTM_FALSE_EASTING: f64 = 500_000.0;
/// UTM false northing in the southern hemisphere (m).
pub const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Largest longitude offset from the central meridian accepted (degrees).
const MAX_LON_OFFSET: f64 = 90.0;

/// A transverse Mercator projection with precomputed series coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
    /// Rectifying radius `A`
    radius: f64,
    /// First eccentricity
    ecc: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl TransverseMercator {
    /// WGS84 projection about central meridian `lon0` (degrees).
    pub fn new(lon0: f64, k0: f64, false_easting: f64, false_northing: f64) -> Self {
        let n = WGS84_F / (2.0 - WGS84_F);
        let n2 = n * n;
        let n3 = n2 * n;
        Self {
            lon0: lon0.to_radians(),
            k0,
            false_easting,
            false_northing,
            radius: WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            ecc: 2.0 * n.sqrt() / (1.0 + n),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
        }
    }

    /// Projection of UTM zone `zone`.
    pub fn utm(zone: u8, north: bool) -> Self {
        let lon0 = f64::from(zone) * 6.0 - 183.0;
        let false_northing = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
        Self::new(lon0, UTM_K0, UTM_FALSE_EASTING, false_northing)
    }

    /// Central meridian (degrees).
    pub fn central_meridian(&self) -> f64 {
        self.lon0.to_degrees()
    }

    /// Project `(lon, lat)` in degrees to `(easting, northing)` in metres.
    ///
    /// # Errors
    /// Returns [`CrsError::OutOfRange`] for latitudes outside `(-90, 90)` or
    /// longitudes more than 90° from the central meridian.
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), CrsError> {
        if !(lat.abs() < 90.0) {
            return Err(CrsError::OutOfRange {
                what: "latitude",
                value: lat,
                min: -90.0,
                max: 90.0,
            });
        }
        let dlon = wrap_degrees(lon - self.central_meridian());
        if !(dlon.abs() < MAX_LON_OFFSET) {
            return Err(CrsError::OutOfRange {
                what: "longitude offset from central meridian",
                value: dlon,
                min: -MAX_LON_OFFSET,
                max: MAX_LON_OFFSET,
            });
        }

        let phi = lat.to_radians();
        let lam = dlon.to_radians();
        let sin_phi = phi.sin();
        let t = (sin_phi.atanh() - self.ecc * (self.ecc * sin_phi).atanh()).sinh();
        let xi_p = t.atan2(lam.cos());
        let eta_p = (lam.sin() / (1.0 + t * t).sqrt()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, alpha) in (1..=3).zip(self.alpha) {
            let k = 2.0 * f64::from(j);
            xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        let scale = self.k0 * self.radius;
        Ok((
            self.false_easting + scale * eta,
            self.false_northing + scale * xi,
        ))
    }

    /// Unproject `(easting, northing)` in metres to `(lon, lat)` in degrees.
    ///
    /// # Errors
    /// Returns [`CrsError::OutOfRange`] for non-finite coordinates.
    pub fn inverse(&self, easting: f64, northing: f64) -> Result<(f64, f64), CrsError> {
        for (what, value) in [("easting", easting), ("northing", northing)] {
            if !value.is_finite() {
                return Err(CrsError::OutOfRange {
                    what,
                    value,
                    min: f64::MIN,
                    max: f64::MAX,
                });
            }
        }

        let scale = self.k0 * self.radius;
        let xi = (northing - self.false_northing) / scale;
        let eta = (easting - self.false_easting) / scale;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, beta) in (1..=3).zip(self.beta) {
            let k = 2.0 * f64::from(j);
            xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let mut phi = chi;
        for (j, delta) in (1..=3).zip(self.delta) {
            phi += delta * (2.0 * f64::from(j) * chi).sin();
        }
        let lam = self.lon0 + eta_p.sinh().atan2(xi_p.cos());

        Ok((wrap_degrees(lam.to_degrees()), phi.to_degrees()))
    }
}

/// Wrap an angle in degrees to `[-180, 180)`.
fn wrap_degrees(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn central_meridian_of_zone() {
        assert_relative_eq!(TransverseMercator::utm(12, true).central_meridian(), -111.0);
        assert_relative_eq!(TransverseMercator::utm(31, true).central_meridian(), 3.0);
    }

    #[test]
    fn equator_on_central_meridian_is_false_origin() {
        let (e, n) = TransverseMercator::utm(31, true).forward(3.0, 0.0).unwrap();
        assert_relative_eq!(e, 500_000.0, epsilon = 1e-6);
        assert_relative_eq!(n, 0.0, epsilon = 1e-6);

        let (_, n) = TransverseMercator::utm(31, false).forward(3.0, 0.0).unwrap();
        assert_relative_eq!(n, 10_000_000.0, epsilon = 1e-6);
    }

    #[test]
    fn null_island_in_zone_31() {
        // Published UTM coordinate of (0°, 0°)
        let (e, n) = TransverseMercator::utm(31, true).forward(0.0, 0.0).unwrap();
        assert_relative_eq!(e, 166_021.443, epsilon = 0.01);
        assert_relative_eq!(n, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn easting_is_symmetric_about_central_meridian() {
        let tm = TransverseMercator::utm(12, true);
        let (e_west, n_west) = tm.forward(-112.0, 40.0).unwrap();
        let (e_east, n_east) = tm.forward(-110.0, 40.0).unwrap();
        assert_relative_eq!(e_west + e_east, 1_000_000.0, epsilon = 1e-6);
        assert_relative_eq!(n_west, n_east, epsilon = 1e-6);
    }

    #[test]
    fn inverse_recovers_geographic_coordinates() {
        let tm = TransverseMercator::utm(12, false);
        for (lon, lat) in [(-111.0, -10.0), (-113.5, -45.2), (-108.1, -0.3)] {
            let (e, n) = tm.forward(lon, lat).unwrap();
            let (lon2, lat2) = tm.inverse(e, n).unwrap();
            assert_relative_eq!(lon, lon2, epsilon = 1e-7);
            assert_relative_eq!(lat, lat2, epsilon = 1e-7);
        }
    }

    #[test]
    fn rejects_out_of_range_input() {
        let tm = TransverseMercator::utm(12, true);
        assert!(tm.forward(-111.0, 90.0).is_err());
        assert!(tm.forward(f64::NAN, 10.0).is_err());
        assert!(tm.forward(80.0, 10.0).is_err());
        assert!(tm.inverse(f64::INFINITY, 0.0).is_err());
    }
}
