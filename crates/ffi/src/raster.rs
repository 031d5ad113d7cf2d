//! Footprint-weighted raster averages over caller buffers

use crate::error::FfpErrorCode;
use crate::helpers::{read_slice, track_result, write_slice};
use ffp_core::{weight_raster_by_footprint, AffineTransform, FootprintError, RasterGrid};
use nalgebra::DMatrix;

/// Weighted mean of a raster over `n` footprint samples.
///
/// The raster holds `rows * cols` values in row-major order, georeferenced by
/// a GDAL-ordered `geo_transform[6]`. Pass `NaN` as `nodata` when the raster
/// has no nodata value. `*out_mean` is `0` when the samples carry no weight.
///
/// # Safety
/// - `x`, `y` and `f` must each be valid for `n` reads.
/// - `values` must be valid for `rows * cols` reads; `geo_transform` for 6 reads.
/// - `out_mean` must be valid for one write.
#[no_mangle]
#[expect(clippy::too_many_arguments)]
pub unsafe extern "C" fn ffp_weight_raster(
    x: *const f64,
    y: *const f64,
    f: *const f64,
    n: usize,
    values: *const f64,
    rows: usize,
    cols: usize,
    geo_transform: *const f64,
    nodata: f64,
    out_mean: *mut f64,
) -> FfpErrorCode {
    let run = || -> Result<(), FfpErrorCode> {
        let x = unsafe { read_slice(x, n, "x")? };
        let y = unsafe { read_slice(y, n, "y")? };
        let f = unsafe { read_slice(f, n, "f")? };
        let values = unsafe { read_slice(values, rows.saturating_mul(cols), "values")? };
        let gt = unsafe { read_slice(geo_transform, 6, "geo_transform")? };
        let out = unsafe { write_slice(out_mean, 1, "out_mean")? };

        let transform = AffineTransform::from_gdal([gt[0], gt[1], gt[2], gt[3], gt[4], gt[5]]);
        let raster = track_result(
            RasterGrid::from_row_slice(rows, cols, values, transform)
                .map_err(FootprintError::from),
        )?;
        let raster = if nodata.is_nan() {
            raster
        } else {
            raster.with_nodata(nodata)
        };

        let column = |v: &[f64]| DMatrix::from_column_slice(n, 1, v);
        out[0] = track_result(
            weight_raster_by_footprint(&column(x), &column(y), &column(f), &raster)
                .map_err(FootprintError::from),
        )?;
        Ok(())
    };
    run().err().unwrap_or(FfpErrorCode::Ok)
}
