//! Footprint-weighted raster averages
//!
//! Every footprint sample is matched to the nearest raster cell centre and the
//! raster value is weighted by the sample's density:
//!
//! ```text
//! w̄ = Σ v(nearest(x, y)) · f(x, y) / Σ f(x, y)     (0 when Σ f = 0)
//! ```

use super::RasterGrid;
use crate::core_types::FootprintField;
use crate::error::RasterError;
use crate::geo::CoordinateSystem;
use nalgebra::DMatrix;
use rayon::prelude::*;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::path::Path;
use tracing::debug;

/// A raster cell centre and its value.
#[derive(Debug, Clone, Copy)]
struct CellCentre {
    point: [f64; 2],
    value: f64,
}

impl RTreeObject for CellCentre {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for CellCentre {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Nearest-neighbour index over the valid cells of a raster.
pub struct RasterIndex {
    tree: RTree<CellCentre>,
}

impl RasterIndex {
    /// Index every cell whose value is finite and not nodata.
    pub fn new(raster: &RasterGrid) -> Self {
        let values = raster.values();
        let cells: Vec<CellCentre> = (0..raster.rows())
            .flat_map(|row| (0..raster.cols()).map(move |col| (row, col)))
            .filter_map(|(row, col)| {
                let value = values[(row, col)];
                raster.is_valid(value).then(|| {
                    let (x, y) = raster.cell_center(row, col);
                    CellCentre {
                        point: [x, y],
                        value,
                    }
                })
            })
            .collect();
        debug!(cells = cells.len(), "Indexed raster cells");
        Self {
            tree: RTree::bulk_load(cells),
        }
    }

    /// Number of indexed cells.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of the cell centre closest to `(x, y)`.
    pub fn nearest(&self, x: f64, y: f64) -> Option<f64> {
        self.tree.nearest_neighbor(&[x, y]).map(|cell| cell.value)
    }

    /// Density-weighted mean of the nearest cell values.
    ///
    /// Samples whose density or coordinates are not finite are ignored.
    ///
    /// # Errors
    /// Returns [`RasterError::SampleShape`] unless `x`, `y` and `f` share a
    /// shape.
    pub fn weighted_mean(
        &self,
        x: &DMatrix<f64>,
        y: &DMatrix<f64>,
        f: &DMatrix<f64>,
    ) -> Result<f64, RasterError> {
        if x.shape() != f.shape() || y.shape() != f.shape() {
            return Err(RasterError::SampleShape {
                x: x.shape(),
                y: y.shape(),
                f: f.shape(),
            });
        }
        let (weighted, total) = x
            .as_slice()
            .par_iter()
            .zip(y.as_slice().par_iter())
            .zip(f.as_slice().par_iter())
            .filter(|((px, py), density)| density.is_finite() && px.is_finite() && py.is_finite())
            .filter_map(|((&px, &py), &density)| {
                self.nearest(px, py).map(|value| (value * density, density))
            })
            .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));

        Ok(if total > 0.0 { weighted / total } else { 0.0 })
    }
}

/// Footprint-weighted mean of `raster` over the samples `(x, y, f)`.
///
/// Returns `0` when the total weight is `0`.
///
/// # Errors
/// Returns [`RasterError::SampleShape`] unless the three matrices share a
/// shape.
pub fn weight_raster_by_footprint(
    x: &DMatrix<f64>,
    y: &DMatrix<f64>,
    f: &DMatrix<f64>,
    raster: &RasterGrid,
) -> Result<f64, RasterError> {
    RasterIndex::new(raster).weighted_mean(x, y, f)
}

/// [`weight_raster_by_footprint`] over a whole field.
///
/// # Errors
/// Returns [`RasterError::SampleShape`] if the field's matrices differ in shape.
pub fn weight_field(field: &FootprintField, raster: &RasterGrid) -> Result<f64, RasterError> {
    weight_raster_by_footprint(&field.x, &field.y, &field.f, raster)
}

/// Supplier of raster grids, such as a file reader.
pub trait RasterSource {
    /// # Errors
    /// Returns [`RasterError`] if the raster cannot be produced.
    fn load(&self, path: &Path) -> Result<RasterGrid, RasterError>;
}

/// Load a raster from `source` and weight it by `field`.
///
/// When both the raster and `field_crs` are known and differ, the raster is
/// reprojected into `field_crs` first.
///
/// # Errors
/// Propagates the source's [`RasterError`] unchanged, or a reprojection
/// failure.
pub fn weight_raster_source(
    field: &FootprintField,
    field_crs: Option<&CoordinateSystem>,
    source: &dyn RasterSource,
    path: &Path,
) -> Result<f64, RasterError> {
    let raster = source.load(path)?;
    let raster = match (field_crs, raster.crs()) {
        (Some(target), Some(crs)) if !crs.is_equivalent(target) => raster.reproject_to(target)?,
        _ => raster,
    };
    weight_field(field, &raster)
}
