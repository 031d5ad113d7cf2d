//! Coordinate transforms between reference systems

use crate::error::CrsError;
use crate::geo::crs::{CoordinateSystem, CrsKind};
use crate::geo::transverse_mercator::TransverseMercator;
use crate::grid::Domain;
use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::debug;

/// Direction of a transform relative to its construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformDirection {
    /// Source → target
    #[default]
    Forward,
    /// Target → source
    Inverse,
}

/// A point transform between two coordinate systems.
///
/// Geographic coordinates are always ordered `(lon, lat)`.
pub trait CoordinateTransform: Send + Sync {
    /// Source → target.
    ///
    /// # Errors
    /// Returns [`CrsError`] when the point cannot be transformed.
    fn forward(&self, x: f64, y: f64) -> Result<(f64, f64), CrsError>;

    /// Target → source.
    ///
    /// # Errors
    /// Returns [`CrsError`] when the point cannot be transformed.
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), CrsError>;

    /// Transform in the given direction.
    ///
    /// # Errors
    /// Returns [`CrsError`] when the point cannot be transformed.
    fn transform(&self, x: f64, y: f64, direction: TransformDirection) -> Result<(f64, f64), CrsError> {
        match direction {
            TransformDirection::Forward => self.forward(x, y),
            TransformDirection::Inverse => self.inverse(x, y),
        }
    }

    /// Bounding box of the four transformed corners of `bounds`.
    ///
    /// # Errors
    /// Returns [`CrsError`] when a corner cannot be transformed.
    fn transform_bounds(&self, bounds: Domain, direction: TransformDirection) -> Result<Domain, CrsError> {
        let corners = bounds
            .corners()
            .into_iter()
            .map(|(x, y)| self.transform(x, y, direction))
            .collect::<Result<Vec<_>, _>>()?;
        // Four corners, never empty
        Ok(Domain::bounding(corners).unwrap_or(bounds))
    }

    /// [`transform_bounds`](Self::transform_bounds) source → target.
    ///
    /// # Errors
    /// Returns [`CrsError`] when a corner cannot be transformed.
    fn forward_bounds(&self, bounds: Domain) -> Result<Domain, CrsError> {
        self.transform_bounds(bounds, TransformDirection::Forward)
    }

    /// [`transform_bounds`](Self::transform_bounds) target → source.
    ///
    /// # Errors
    /// Returns [`CrsError`] when a corner cannot be transformed.
    fn inverse_bounds(&self, bounds: Domain) -> Result<Domain, CrsError> {
        self.transform_bounds(bounds, TransformDirection::Inverse)
    }

    /// Transform paired coordinate matrices element by element.
    ///
    /// # Errors
    /// Returns the first [`CrsError`] encountered.
    fn transform_matrices(
        &self,
        x: &DMatrix<f64>,
        y: &DMatrix<f64>,
        direction: TransformDirection,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), CrsError> {
        let (rows, cols) = x.shape();
        let points = x
            .as_slice()
            .par_iter()
            .zip(y.as_slice().par_iter())
            .map(|(&px, &py)| self.transform(px, py, direction))
            .collect::<Result<Vec<_>, _>>()?;
        let (xs, ys): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
        Ok((DMatrix::from_vec(rows, cols, xs), DMatrix::from_vec(rows, cols, ys)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pipeline {
    Identity,
    /// Geographic → projected
    Project(TransverseMercator),
    /// Projected → geographic
    Unproject(TransverseMercator),
    /// Projected → geographic → projected
    Reproject(TransverseMercator, TransverseMercator),
}

/// Built-in transform between WGS84 geographic and WGS84 UTM systems.
#[derive(Debug, Clone, PartialEq)]
pub struct CrsTransformer {
    source: CoordinateSystem,
    target: CoordinateSystem,
    pipeline: Pipeline,
}

impl CrsTransformer {
    /// Build the transform `source → target`.
    ///
    /// Equivalent systems always yield an identity transform.
    ///
    /// # Errors
    /// Returns [`CrsError::UnsupportedCrs`] when either side is outside the
    /// built-in provider.
    pub fn new(source: &CoordinateSystem, target: &CoordinateSystem) -> Result<Self, CrsError> {
        let pipeline = if source.is_equivalent(target) {
            Pipeline::Identity
        } else {
            match (source.kind(), target.kind()) {
                (CrsKind::Geographic, CrsKind::Utm { zone, north }) => {
                    Pipeline::Project(TransverseMercator::utm(zone, north))
                }
                (CrsKind::Utm { zone, north }, CrsKind::Geographic) => {
                    Pipeline::Unproject(TransverseMercator::utm(zone, north))
                }
                (CrsKind::Utm { zone: z1, north: n1 }, CrsKind::Utm { zone: z2, north: n2 }) => {
                    Pipeline::Reproject(TransverseMercator::utm(z1, n1), TransverseMercator::utm(z2, n2))
                }
                _ => {
                    return Err(CrsError::UnsupportedCrs {
                        source_crs: source.to_string(),
                        target_crs: target.to_string(),
                    })
                }
            }
        };
        debug!(source = %source, target = %target, ?pipeline, "Built coordinate transform");
        Ok(Self {
            source: source.clone(),
            target: target.clone(),
            pipeline,
        })
    }

    pub fn source(&self) -> &CoordinateSystem {
        &self.source
    }

    pub fn target(&self) -> &CoordinateSystem {
        &self.target
    }

    pub fn is_identity(&self) -> bool {
        self.pipeline == Pipeline::Identity
    }

    /// The transform `target → source`.
    pub fn reversed(&self) -> Self {
        let pipeline = match self.pipeline {
            Pipeline::Identity => Pipeline::Identity,
            Pipeline::Project(tm) => Pipeline::Unproject(tm),
            Pipeline::Unproject(tm) => Pipeline::Project(tm),
            Pipeline::Reproject(from, to) => Pipeline::Reproject(to, from),
        };
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
            pipeline,
        }
    }
}

impl CoordinateTransform for CrsTransformer {
    fn forward(&self, x: f64, y: f64) -> Result<(f64, f64), CrsError> {
        match self.pipeline {
            Pipeline::Identity => Ok((x, y)),
            Pipeline::Project(tm) => tm.forward(x, y),
            Pipeline::Unproject(tm) => tm.inverse(x, y),
            Pipeline::Reproject(from, to) => {
                let (lon, lat) = from.inverse(x, y)?;
                to.forward(lon, lat)
            }
        }
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), CrsError> {
        match self.pipeline {
            Pipeline::Identity => Ok((x, y)),
            Pipeline::Project(tm) => tm.inverse(x, y),
            Pipeline::Unproject(tm) => tm.forward(x, y),
            Pipeline::Reproject(from, to) => {
                let (lon, lat) = to.inverse(x, y)?;
                from.forward(lon, lat)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn utm(code: u32) -> CoordinateSystem {
        CoordinateSystem::from_epsg(code).unwrap()
    }

    #[test]
    fn identical_systems_are_identity() {
        let t = CrsTransformer::new(&utm(32612), &utm(32612)).unwrap();
        assert!(t.is_identity());
        assert_eq!(t.forward(1.0, 2.0).unwrap(), (1.0, 2.0));
    }

    #[test]
    fn geographic_to_utm_round_trip() {
        let t = CrsTransformer::new(&CoordinateSystem::wgs84(), &utm(32612)).unwrap();
        let (e, n) = t.forward(-111.0, 40.0).unwrap();
        assert_relative_eq!(e, 500_000.0, epsilon = 1e-6);
        assert!(n > 4_400_000.0 && n < 4_450_000.0);
        let (lon, lat) = t.inverse(e, n).unwrap();
        assert_relative_eq!(lon, -111.0, epsilon = 1e-7);
        assert_relative_eq!(lat, 40.0, epsilon = 1e-7);
    }

    #[test]
    fn reversed_swaps_direction() {
        let t = CrsTransformer::new(&CoordinateSystem::wgs84(), &utm(32612)).unwrap();
        let back = t.reversed();
        let (e, n) = t.forward(-110.5, 41.0).unwrap();
        assert_eq!(back.forward(e, n).unwrap(), t.inverse(e, n).unwrap());
        assert_eq!(back.source(), t.target());
    }

    #[test]
    fn zone_to_zone() {
        let t = CrsTransformer::new(&utm(32612), &utm(32613)).unwrap();
        let (e, n) = t.forward(720_000.0, 4_430_000.0).unwrap();
        let (e2, n2) = t.inverse(e, n).unwrap();
        assert_relative_eq!(e2, 720_000.0, epsilon = 1e-3);
        assert_relative_eq!(n2, 4_430_000.0, epsilon = 1e-3);
    }

    #[test]
    fn unsupported_pair_fails() {
        let lcc: CoordinateSystem =
            serde_json::from_str(r#"{"definition": "+proj=lcc +lat_1=33", "units": "metre"}"#).unwrap();
        assert!(matches!(
            CrsTransformer::new(&CoordinateSystem::wgs84(), &lcc),
            Err(CrsError::UnsupportedCrs { .. })
        ));
        assert!(CrsTransformer::new(&lcc, &lcc).unwrap().is_identity());
    }

    #[test]
    fn bounds_cover_all_corners() {
        let t = CrsTransformer::new(&CoordinateSystem::wgs84(), &utm(32612)).unwrap();
        let bounds = t.forward_bounds(Domain::new(-111.01, -110.99, 39.99, 40.01)).unwrap();
        for (lon, lat) in Domain::new(-111.01, -110.99, 39.99, 40.01).corners() {
            let (e, n) = t.forward(lon, lat).unwrap();
            assert!(e >= bounds.xmin && e <= bounds.xmax);
            assert!(n >= bounds.ymin && n <= bounds.ymax);
        }
    }

    #[test]
    fn matrices_keep_shape() {
        let t = CrsTransformer::new(&CoordinateSystem::wgs84(), &utm(32612)).unwrap();
        let x = DMatrix::from_fn(3, 4, |_, c| -111.0 + c as f64 * 0.01);
        let y = DMatrix::from_fn(3, 4, |r, _| 40.0 + r as f64 * 0.01);
        let (e, n) = t.transform_matrices(&x, &y, TransformDirection::Forward).unwrap();
        assert_eq!(e.shape(), (3, 4));
        let (e12, n12) = t.forward(x[(1, 2)], y[(1, 2)]).unwrap();
        assert_eq!((e[(1, 2)], n[(1, 2)]), (e12, n12));
    }
}
