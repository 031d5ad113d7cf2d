//! Pixel-to-world affine transforms
//!
//! ```text
//! x' = a·col + b·row + c
//! y' = d·col + e·row + f
//! ```

use crate::error::RasterError;
use serde::{Deserialize, Serialize};

/// Determinant magnitude below which a transform is treated as singular.
const SINGULAR_DETERMINANT: f64 = 1e-15;

/// Affine transform from pixel `(col, row)` to world `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    /// North-up transform with the top-left corner at `(west, north)`.
    pub fn from_origin(west: f64, north: f64, xres: f64, yres: f64) -> Self {
        Self::new(xres, 0.0, west, 0.0, -yres, north)
    }

    /// From a GDAL geotransform `[c, a, b, f, d, e]`.
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    /// As a GDAL geotransform `[c, a, b, f, d, e]`.
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    #[inline]
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// World-to-pixel transform.
    ///
    /// # Errors
    /// Returns [`RasterError::DegenerateTransform`] for a singular transform.
    pub fn inverse(&self) -> Result<Self, RasterError> {
        let det = self.determinant();
        if !(det.abs() >= SINGULAR_DETERMINANT) {
            return Err(RasterError::DegenerateTransform { determinant: det });
        }
        let inv = det.recip();
        Ok(Self::new(
            self.e * inv,
            -self.b * inv,
            (self.b * self.f - self.c * self.e) * inv,
            -self.d * inv,
            self.a * inv,
            (self.c * self.d - self.a * self.f) * inv,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn north_up_origin() {
        let t = AffineTransform::from_origin(500.0, 2000.0, 10.0, 10.0);
        assert_eq!(t.apply(0.0, 0.0), (500.0, 2000.0));
        assert_eq!(t.apply(2.5, 1.5), (525.0, 1985.0));
    }

    #[test]
    fn gdal_order() {
        let t = AffineTransform::from_gdal([100.0, 2.0, 0.0, 300.0, 0.0, -2.0]);
        assert_eq!(t, AffineTransform::new(2.0, 0.0, 100.0, 0.0, -2.0, 300.0));
        assert_eq!(t.to_gdal(), [100.0, 2.0, 0.0, 300.0, 0.0, -2.0]);
    }

    #[test]
    fn inverse_undoes_apply() {
        let t = AffineTransform::new(3.0, 0.5, 10.0, -0.2, -4.0, 50.0);
        let (x, y) = t.apply(7.0, 11.0);
        let (col, row) = t.inverse().unwrap().apply(x, y);
        assert_relative_eq!(col, 7.0, epsilon = 1e-12);
        assert_relative_eq!(row, 11.0, epsilon = 1e-12);
    }

    #[test]
    fn singular_transform_has_no_inverse() {
        let t = AffineTransform::new(1.0, 2.0, 0.0, 2.0, 4.0, 0.0);
        assert!(matches!(t.inverse(), Err(RasterError::DegenerateTransform { .. })));
    }
}
