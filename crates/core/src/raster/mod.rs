//! External raster grids and footprint-weighted averages

pub mod affine;
pub mod weighting;

pub use affine::AffineTransform;
pub use weighting::{
    weight_field, weight_raster_by_footprint, weight_raster_source, RasterIndex, RasterSource,
};

use crate::error::RasterError;
use crate::geo::{CoordinateSystem, CoordinateTransform, CrsTransformer};
use crate::grid::Domain;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single-band raster: cell values plus their placement in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RasterRecord", into = "RasterRecord")]
pub struct RasterGrid {
    values: DMatrix<f64>,
    transform: AffineTransform,
    crs: Option<CoordinateSystem>,
    nodata: Option<f64>,
}

impl RasterGrid {
    /// # Errors
    /// Returns [`RasterError::DegenerateTransform`] for a singular transform.
    pub fn new(values: DMatrix<f64>, transform: AffineTransform) -> Result<Self, RasterError> {
        transform.inverse()?;
        Ok(Self {
            values,
            transform,
            crs: None,
            nodata: None,
        })
    }

    /// Build from row-major values.
    ///
    /// # Errors
    /// Returns [`RasterError::Shape`] if `values.len() != rows * cols`, or
    /// [`RasterError::DegenerateTransform`] for a singular transform.
    pub fn from_row_slice(
        rows: usize,
        cols: usize,
        values: &[f64],
        transform: AffineTransform,
    ) -> Result<Self, RasterError> {
        if values.len() != rows * cols {
            return Err(RasterError::Shape {
                rows,
                cols,
                len: values.len(),
            });
        }
        Self::new(DMatrix::from_row_slice(rows, cols, values), transform)
    }

    #[must_use]
    pub fn with_crs(mut self, crs: CoordinateSystem) -> Self {
        self.crs = Some(crs);
        self
    }

    #[must_use]
    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn crs(&self) -> Option<&CoordinateSystem> {
        self.crs.as_ref()
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    /// World coordinates of the centre of cell `(row, col)`.
    #[expect(clippy::cast_precision_loss, reason = "raster dimensions are far below 2^52")]
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        self.transform.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// True for a cell value that takes part in weighting.
    pub fn is_valid(&self, value: f64) -> bool {
        value.is_finite() && self.nodata != Some(value)
    }

    /// World-space bounding box of the grid's outer edges.
    #[expect(clippy::cast_precision_loss, reason = "raster dimensions are far below 2^52")]
    pub fn bounds(&self) -> Domain {
        let (cols, rows) = (self.cols() as f64, self.rows() as f64);
        let corners = [(0.0, 0.0), (cols, 0.0), (cols, rows), (0.0, rows)]
            .map(|(c, r)| self.transform.apply(c, r));
        let t = self.transform;
        Domain::bounding(corners).unwrap_or_else(|| Domain::new(t.c, t.c, t.f, t.f))
    }

    /// Re-place the grid in the target space of `transform`.
    ///
    /// The bounds are transformed and the pixel scale is stretched by the
    /// width and height ratios; values are not resampled. The result carries
    /// no CRS.
    ///
    /// # Errors
    /// Returns [`RasterError::Reprojection`] if the bounds cannot be
    /// transformed, or [`RasterError::DegenerateTransform`] for an empty grid.
    pub fn reprojected(&self, transform: &dyn CoordinateTransform) -> Result<Self, RasterError> {
        let src = self.bounds();
        let dst = transform.forward_bounds(src)?;
        let width_ratio = dst.width() / src.width();
        let height_ratio = dst.height() / src.height();
        let t = self.transform;
        let north = if t.e < 0.0 { dst.ymax } else { dst.ymin };
        let west = if t.a < 0.0 { dst.xmax } else { dst.xmin };
        let affine = AffineTransform::new(
            t.a * width_ratio,
            t.b,
            west,
            t.d,
            t.e * height_ratio,
            north,
        );
        debug!(?src, ?dst, "Reprojected raster bounds");
        Self {
            values: self.values.clone(),
            transform: affine,
            crs: None,
            nodata: self.nodata,
        }
        .checked()
    }

    /// [`reprojected`](Self::reprojected) from this grid's CRS into `target`.
    ///
    /// # Errors
    /// Returns [`RasterError::MissingCrs`] if the grid has no CRS, or the
    /// errors of [`reprojected`](Self::reprojected).
    pub fn reproject_to(&self, target: &CoordinateSystem) -> Result<Self, RasterError> {
        let source = self.crs.as_ref().ok_or(RasterError::MissingCrs)?;
        let transformer = CrsTransformer::new(source, target)?;
        Ok(self.reprojected(&transformer)?.with_crs(target.clone()))
    }

    fn checked(self) -> Result<Self, RasterError> {
        self.transform.inverse()?;
        Ok(self)
    }
}

/// Serialised form of a [`RasterGrid`]; values are row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RasterRecord {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
    transform: AffineTransform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crs: Option<CoordinateSystem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nodata: Option<f64>,
}

impl TryFrom<RasterRecord> for RasterGrid {
    type Error = RasterError;

    fn try_from(record: RasterRecord) -> Result<Self, Self::Error> {
        let grid = Self::from_row_slice(record.rows, record.cols, &record.values, record.transform)?;
        Ok(Self {
            crs: record.crs,
            nodata: record.nodata,
            ..grid
        })
    }
}

impl From<RasterGrid> for RasterRecord {
    fn from(grid: RasterGrid) -> Self {
        Self {
            rows: grid.rows(),
            cols: grid.cols(),
            values: grid.values.transpose().as_slice().to_vec(),
            transform: grid.transform,
            crs: grid.crs,
            nodata: grid.nodata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> RasterGrid {
        RasterGrid::from_row_slice(
            2,
            3,
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            AffineTransform::from_origin(100.0, 200.0, 10.0, 10.0),
        )
        .unwrap()
    }

    #[test]
    fn shape_is_checked() {
        let err = RasterGrid::from_row_slice(2, 2, &[1.0], AffineTransform::identity()).unwrap_err();
        assert_eq!(err, RasterError::Shape { rows: 2, cols: 2, len: 1 });
    }

    #[test]
    fn cell_centres_follow_transform() {
        let g = grid();
        assert_eq!(g.cell_center(0, 0), (105.0, 195.0));
        assert_eq!(g.cell_center(1, 2), (125.0, 185.0));
        assert_eq!(g.values()[(1, 2)], 6.0);
    }

    #[test]
    fn bounds_cover_outer_edges() {
        assert_eq!(grid().bounds(), Domain::new(100.0, 130.0, 180.0, 200.0));
    }

    #[test]
    fn nodata_and_nan_are_invalid() {
        let g = grid().with_nodata(-9999.0);
        assert!(g.is_valid(3.0));
        assert!(!g.is_valid(-9999.0));
        assert!(!g.is_valid(f64::NAN));
    }

    #[test]
    fn serde_keeps_row_major_order() {
        let json = serde_json::to_string(&grid()).unwrap();
        let back: RasterGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid());
        assert!(json.contains("[1.0,2.0,3.0,4.0,5.0,6.0]"));
    }

    #[test]
    fn reproject_requires_crs() {
        assert_eq!(
            grid().reproject_to(&CoordinateSystem::wgs84()),
            Err(RasterError::MissingCrs)
        );
    }

    #[test]
    fn reprojection_rescales_pixel_size() {
        let utm = CoordinateSystem::from_epsg(32612).unwrap();
        let g = RasterGrid::from_row_slice(
            2,
            2,
            &[1.0, 2.0, 3.0, 4.0],
            AffineTransform::from_origin(-111.01, 40.01, 0.01, 0.01),
        )
        .unwrap()
        .with_crs(CoordinateSystem::wgs84());
        let projected = g.reproject_to(&utm).unwrap();
        let bounds = projected.bounds();
        let expected = CrsTransformer::new(&CoordinateSystem::wgs84(), &utm)
            .unwrap()
            .forward_bounds(g.bounds())
            .unwrap();
        assert_relative_eq!(bounds.xmin, expected.xmin, epsilon = 1e-6);
        assert_relative_eq!(bounds.ymax, expected.ymax, epsilon = 1e-6);
        assert_relative_eq!(bounds.width(), expected.width(), max_relative = 1e-9);
        assert_eq!(projected.values(), g.values());
        assert_eq!(projected.crs(), Some(&utm));
    }
}
