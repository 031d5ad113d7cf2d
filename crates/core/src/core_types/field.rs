//! Computed footprint fields and climatology aggregates

use crate::error::{FootprintError, FootprintResult};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// A 2-D footprint density field on a receptor grid.
///
/// `x`, `y` and `f` share one shape. Rows follow the `y` axis and columns the
/// `x` axis, so `x[(r, c)]` depends only on `c` and `y[(r, c)]` only on `r`
/// for a freshly computed field (a reprojected field may be curvilinear).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintField {
    /// Receptor x coordinates
    pub x: DMatrix<f64>,
    /// Receptor y coordinates
    pub y: DMatrix<f64>,
    /// Footprint density (m⁻²), non-negative and finite
    pub f: DMatrix<f64>,
}

/// Location and value of a field maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldPeak {
    pub row: usize,
    pub col: usize,
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl FootprintField {
    /// Assemble a field, checking that all three matrices share a shape.
    ///
    /// # Errors
    /// Returns [`FootprintError::InvalidGrid`] on a shape mismatch.
    pub fn new(x: DMatrix<f64>, y: DMatrix<f64>, f: DMatrix<f64>) -> FootprintResult<Self> {
        if x.shape() != f.shape() || y.shape() != f.shape() {
            return Err(FootprintError::InvalidGrid(format!(
                "coordinate shapes {:?}/{:?} do not match density shape {:?}",
                x.shape(),
                y.shape(),
                f.shape()
            )));
        }
        Ok(Self { x, y, f })
    }

    /// `(rows, cols)` of the field.
    pub fn shape(&self) -> (usize, usize) {
        self.f.shape()
    }

    /// Grid maximum, or `None` for an all-zero field.
    pub fn peak(&self) -> Option<FieldPeak> {
        let (rows, cols) = self.shape();
        let mut best: Option<FieldPeak> = None;
        for col in 0..cols {
            for row in 0..rows {
                let value = self.f[(row, col)];
                if value > best.map_or(0.0, |p| p.value) {
                    best = Some(FieldPeak {
                        row,
                        col,
                        x: self.x[(row, col)],
                        y: self.y[(row, col)],
                        value,
                    });
                }
            }
        }
        best
    }

    /// Sum of all density values.
    pub fn total_weight(&self) -> f64 {
        self.f.sum()
    }

    /// Approximate integral of the density over a regular grid.
    ///
    /// Uses the spacing between the first two columns and rows; returns `0`
    /// for grids smaller than 2×2.
    pub fn integral(&self) -> f64 {
        let (rows, cols) = self.shape();
        if rows < 2 || cols < 2 {
            return 0.0;
        }
        let dx = (self.x[(0, 1)] - self.x[(0, 0)]).abs();
        let dy = (self.y[(1, 0)] - self.y[(0, 0)]).abs();
        self.total_weight() * dx * dy
    }
}

/// One climatology member that did not contribute.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInput {
    /// Position in the input series
    pub index: usize,
    /// Why the member was excluded
    pub reason: FootprintError,
}

/// Time-averaged footprint over a series of observations.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimatologyResult {
    /// Averaged field; `field.f` is `fclim`
    pub field: FootprintField,
    /// Number of observations that contributed (always ≥ 1)
    pub n: usize,
    /// Members excluded from the average, ordered by index
    pub skipped: Vec<SkippedInput>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_is_rejected() {
        let x = DMatrix::zeros(3, 3);
        let y = DMatrix::zeros(3, 3);
        let f = DMatrix::zeros(3, 2);
        assert!(matches!(
            FootprintField::new(x, y, f),
            Err(FootprintError::InvalidGrid(_))
        ));
    }

    #[test]
    fn peak_finds_maximum() {
        let x = DMatrix::from_fn(3, 3, |_, c| c as f64);
        let y = DMatrix::from_fn(3, 3, |r, _| r as f64 * 10.0);
        let mut f = DMatrix::zeros(3, 3);
        f[(2, 1)] = 5.0;
        f[(0, 0)] = 1.0;
        let field = FootprintField::new(x, y, f).unwrap();
        let peak = field.peak().unwrap();
        assert_eq!((peak.row, peak.col), (2, 1));
        assert_eq!((peak.x, peak.y, peak.value), (1.0, 20.0, 5.0));
        assert_eq!(field.total_weight(), 6.0);
        assert_eq!(field.integral(), 60.0);
    }

    #[test]
    fn all_zero_field_has_no_peak() {
        let z = DMatrix::zeros(2, 2);
        let field = FootprintField::new(z.clone(), z.clone(), z).unwrap();
        assert!(field.peak().is_none());
    }
}
