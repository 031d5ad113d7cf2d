//! Receptor grid and sensor-relative polar coordinates
//!
//! The FFP model is evaluated on a square `nx × nx` grid of receptor points.
//! Each receptor is converted to polar form relative to the sensor:
//!
//! ```text
//! ρ = sqrt(x² + y²)
//! θ = atan2(x, y)            (angle measured from the +y axis)
//! θ' = θ − wind_dir · π/180  (when a wind direction is given)
//! ```
//!
//! With `atan2(x, y)` the angle is measured from the downwind (+y) axis, so
//! `ρ·cosθ` is the along-wind and `ρ·sinθ` the crosswind
//! distance. Wind direction enters the geometry only through this rotation.

use crate::error::{FootprintError, FootprintResult};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Default half-width of the analysis domain (m).
pub const DEFAULT_HALF_EXTENT: f64 = 1000.0;

/// Axis-aligned analysis rectangle.
///
/// Serialises as `[xmin, xmax, ymin, ymax]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Domain {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Default for Domain {
    fn default() -> Self {
        Self::centered(DEFAULT_HALF_EXTENT)
    }
}

impl From<[f64; 4]> for Domain {
    fn from([xmin, xmax, ymin, ymax]: [f64; 4]) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }
}

impl From<Domain> for [f64; 4] {
    fn from(d: Domain) -> Self {
        [d.xmin, d.xmax, d.ymin, d.ymax]
    }
}

impl Domain {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// Square domain `[-half, half]²` around the origin.
    pub fn centered(half: f64) -> Self {
        Self::new(-half, half, -half, half)
    }

    /// Square domain of half-width `half` around `(cx, cy)`.
    pub fn around(cx: f64, cy: f64, half: f64) -> Self {
        Self::new(cx - half, cx + half, cy - half, cy + half)
    }

    /// Smallest domain containing every point.
    ///
    /// Returns `None` for an empty iterator.
    pub fn bounding<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Self::new(x, x, y, y),
                Some(d) => Self::new(d.xmin.min(x), d.xmax.max(x), d.ymin.min(y), d.ymax.max(y)),
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// The four corners, counter-clockwise from `(xmin, ymin)`.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.xmin, self.ymin),
            (self.xmax, self.ymin),
            (self.xmax, self.ymax),
            (self.xmin, self.ymax),
        ]
    }

    /// Check that bounds are finite and non-degenerate.
    ///
    /// # Errors
    /// Returns [`FootprintError::InvalidGrid`] otherwise.
    pub fn validate(&self) -> FootprintResult<()> {
        let finite = [self.xmin, self.xmax, self.ymin, self.ymax]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.xmax <= self.xmin || self.ymax <= self.ymin {
            return Err(FootprintError::InvalidGrid(format!(
                "domain [{}, {}, {}, {}] must be finite with max > min",
                self.xmin, self.xmax, self.ymin, self.ymax
            )));
        }
        Ok(())
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            values[n - 1] = end;
            values
        }
    }
}

/// Polar coordinates of an offset `(dx, dy)` from the sensor.
///
/// Returns `(ρ, θ)` with `θ = atan2(dx, dy)`, rotated by the wind direction
/// when one is given.
#[inline]
pub fn to_polar(dx: f64, dy: f64, wind_dir: Option<f64>) -> (f64, f64) {
    let rho = dx.hypot(dy);
    let theta = dx.atan2(dy);
    match wind_dir {
        Some(dir) => (rho, theta - dir.to_radians()),
        None => (rho, theta),
    }
}

/// Square receptor grid over a [`Domain`].
#[derive(Debug, Clone, PartialEq)]
pub struct GridDomain {
    domain: Domain,
    xs: Vec<f64>,
    ys: Vec<f64>,
    origin: (f64, f64),
}

impl GridDomain {
    /// Build an `nx × nx` grid spanning `domain`, with the sensor at `(0, 0)`.
    ///
    /// # Errors
    /// Returns [`FootprintError::InvalidGrid`] if `nx < 2` or the domain is
    /// degenerate.
    pub fn new(domain: Domain, nx: usize) -> FootprintResult<Self> {
        if nx < 2 {
            return Err(FootprintError::InvalidGrid(format!(
                "grid needs at least 2 points per side, got {nx}"
            )));
        }
        domain.validate()?;
        Ok(Self {
            domain,
            xs: linspace(domain.xmin, domain.xmax, nx),
            ys: linspace(domain.ymin, domain.ymax, nx),
            origin: (0.0, 0.0),
        })
    }

    /// Place the sensor at `(ox, oy)` in grid coordinates.
    ///
    /// Receptor offsets are then measured from this point, which lets a grid
    /// laid out in absolute (projected) coordinates be evaluated directly.
    pub fn with_origin(mut self, ox: f64, oy: f64) -> Self {
        self.origin = (ox, oy);
        self
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Points per side.
    pub fn nx(&self) -> usize {
        self.xs.len()
    }

    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    /// Column coordinates.
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Row coordinates.
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Sensor-relative offset of receptor `(row, col)`.
    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> (f64, f64) {
        (self.xs[col] - self.origin.0, self.ys[row] - self.origin.1)
    }

    /// `meshgrid`-style coordinate matrices `(x, y)`.
    pub fn mesh(&self) -> (DMatrix<f64>, DMatrix<f64>) {
        let n = self.nx();
        let x = DMatrix::from_fn(n, n, |_, c| self.xs[c]);
        let y = DMatrix::from_fn(n, n, |r, _| self.ys[r]);
        (x, y)
    }

    /// Polar matrices `(ρ, θ)` for every receptor.
    pub fn polar(&self, wind_dir: Option<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
        let n = self.nx();
        let mut rho = DMatrix::zeros(n, n);
        let mut theta = DMatrix::zeros(n, n);
        for c in 0..n {
            for r in 0..n {
                let (dx, dy) = self.offset(r, c);
                let (p, t) = to_polar(dx, dy, wind_dir);
                rho[(r, c)] = p;
                theta[(r, c)] = t;
            }
        }
        (rho, theta)
    }
}
