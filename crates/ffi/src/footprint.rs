//! Single footprints and climatologies over caller-owned buffers
//!
//! Matrices are written row-major: element `(row, col)` of an `nx × nx`
//! result lands at index `row * nx + col`, with rows running south to north.

use crate::error::{DefaultFfpError, FfpErrorCode};
use crate::helpers::{copy_into, read_slice, track_error, track_result, write_slice};
use ffp_core::{
    compute_footprint, compute_footprint_climatology, Domain, FootprintError, FootprintField,
    FootprintInput, FootprintOptions, RawObservation,
};
use nalgebra::DMatrix;

/// One observation as passed from C.
///
/// Exactly one of `z0` and `umean` must be finite; pass `NaN` for the other.
/// `wind_dir` is `NaN` when the footprint should stay aligned with +y.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfpInput {
    /// Measurement height above displacement height (m)
    pub zm: f64,
    /// Roughness length (m), or `NaN`
    pub z0: f64,
    /// Mean wind speed at `zm` (m/s), or `NaN`
    pub umean: f64,
    /// Boundary layer height (m)
    pub h: f64,
    /// Obukhov length (m)
    pub ol: f64,
    /// Standard deviation of lateral velocity fluctuations (m/s)
    pub sigmav: f64,
    /// Friction velocity (m/s)
    pub ustar: f64,
    /// Wind direction in degrees from north, or `NaN`
    pub wind_dir: f64,
}

impl FfpInput {
    pub(crate) fn to_input(self) -> Result<FootprintInput, FootprintError> {
        let present = |v: f64| (!v.is_nan()).then_some(v);
        let raw = RawObservation {
            zm: self.zm,
            z0: present(self.z0),
            umean: present(self.umean),
            h: self.h,
            ol: self.ol,
            sigmav: self.sigmav,
            ustar: self.ustar,
            wind_dir: present(self.wind_dir),
        };
        Ok(FootprintInput::try_from(raw)?)
    }
}

/// Receptor grid options as passed from C.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfpOptions {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    /// Receptor points per grid side
    pub nx: usize,
    /// Non-zero to smooth the result
    pub smooth: u8,
}

impl From<FfpOptions> for FootprintOptions {
    fn from(options: FfpOptions) -> Self {
        Self {
            domain: Domain::new(options.xmin, options.xmax, options.ymin, options.ymax),
            nx: options.nx,
            smooth: options.smooth != 0,
        }
    }
}

/// Caller buffers receiving a field, each of `len` values.
pub(crate) struct FieldBuffers<'a> {
    pub x: &'a mut [f64],
    pub y: &'a mut [f64],
    pub f: &'a mut [f64],
}

impl FieldBuffers<'_> {
    /// # Safety
    /// Each non-null pointer must be valid for `len` writes.
    pub(crate) unsafe fn new(
        out_x: *mut f64,
        out_y: *mut f64,
        out_f: *mut f64,
        len: usize,
    ) -> Result<Self, FfpErrorCode> {
        unsafe {
            Ok(Self {
                x: write_slice(out_x, len, "out_x")?,
                y: write_slice(out_y, len, "out_y")?,
                f: write_slice(out_f, len, "out_f")?,
            })
        }
    }

    pub(crate) fn fill(self, field: &FootprintField) -> Result<(), FfpErrorCode> {
        copy_into(&row_major(&field.x), self.x, "out_x")?;
        copy_into(&row_major(&field.y), self.y, "out_y")?;
        copy_into(&row_major(&field.f), self.f, "out_f")
    }
}

fn row_major(m: &DMatrix<f64>) -> Vec<f64> {
    m.transpose().as_slice().to_vec()
}

fn check_capacity(len: usize, nx: usize) -> Result<(), FfpErrorCode> {
    match nx.checked_mul(nx) {
        Some(required) if required <= len => Ok(()),
        Some(required) => Err(track_error(&DefaultFfpError::buffer_too_small(
            "out_f", len, required,
        ))),
        None => Err(track_error(&DefaultFfpError::invalid_parameter(format!(
            "nx = {nx} is too large"
        )))),
    }
}

/// Compute the footprint of one observation into caller buffers.
///
/// `out_x`, `out_y` and `out_f` must each hold at least `nx * nx` values.
///
/// # Safety
/// - `input` and `options` must point to valid structs.
/// - `out_x`, `out_y` and `out_f` must each be valid for `len` writes and must not overlap.
#[no_mangle]
pub unsafe extern "C" fn ffp_compute_footprint(
    input: *const FfpInput,
    options: *const FfpOptions,
    out_x: *mut f64,
    out_y: *mut f64,
    out_f: *mut f64,
    len: usize,
) -> FfpErrorCode {
    let run = || -> Result<(), FfpErrorCode> {
        let input = unsafe { read_slice(input, 1, "input")? }[0];
        let options = unsafe { read_slice(options, 1, "options")? }[0];
        check_capacity(len, options.nx)?;
        let buffers = unsafe { FieldBuffers::new(out_x, out_y, out_f, len)? };

        let field = track_result(
            input
                .to_input()
                .and_then(|input| compute_footprint(&input, &options.into())),
        )?;
        buffers.fill(&field)
    };
    run().err().unwrap_or(FfpErrorCode::Ok)
}

/// Compute the climatology of `count` observations into caller buffers.
///
/// Observations failing validation are skipped; `out_n_valid` receives the
/// number that contributed. A record with neither or both of `z0`/`umean`
/// fails the whole call with `InvalidInput`.
///
/// # Safety
/// - `inputs` must be valid for `count` reads; `options` must point to a valid struct.
/// - `out_x`, `out_y` and `out_f` must each be valid for `len` writes and must not overlap.
/// - `out_n_valid` must be valid for one write.
#[no_mangle]
#[expect(clippy::too_many_arguments)]
pub unsafe extern "C" fn ffp_compute_climatology(
    inputs: *const FfpInput,
    count: usize,
    options: *const FfpOptions,
    out_x: *mut f64,
    out_y: *mut f64,
    out_f: *mut f64,
    len: usize,
    out_n_valid: *mut usize,
) -> FfpErrorCode {
    let run = || -> Result<(), FfpErrorCode> {
        let inputs = unsafe { read_slice(inputs, count, "inputs")? };
        let options = unsafe { read_slice(options, 1, "options")? }[0];
        let n_valid = unsafe { write_slice(out_n_valid, 1, "out_n_valid")? };
        check_capacity(len, options.nx)?;
        let buffers = unsafe { FieldBuffers::new(out_x, out_y, out_f, len)? };

        let series = track_result(
            inputs
                .iter()
                .map(|input| input.to_input())
                .collect::<Result<Vec<_>, _>>(),
        )?;
        let result = track_result(compute_footprint_climatology(&series, &options.into()))?;
        n_valid[0] = result.n;
        buffers.fill(&result.field)
    };
    run().err().unwrap_or(FfpErrorCode::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ffp_get_last_error_code;
    use approx::assert_relative_eq;

    fn grass() -> FfpInput {
        FfpInput {
            zm: 2.0,
            z0: 0.02,
            umean: f64::NAN,
            h: 1000.0,
            ol: -50.0,
            sigmav: 0.5,
            ustar: 0.3,
            wind_dir: 0.0,
        }
    }

    fn options(nx: usize) -> FfpOptions {
        FfpOptions {
            xmin: -100.0,
            xmax: 100.0,
            ymin: -100.0,
            ymax: 100.0,
            nx,
            smooth: 0,
        }
    }

    #[test]
    fn footprint_is_written_row_major() {
        let nx = 11;
        let (mut x, mut y, mut f) = (vec![0.0; nx * nx], vec![0.0; nx * nx], vec![0.0; nx * nx]);
        let code = unsafe {
            ffp_compute_footprint(
                &grass(),
                &options(nx),
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                f.as_mut_ptr(),
                nx * nx,
            )
        };
        assert_eq!(code, FfpErrorCode::Ok);
        // First row is the southern edge, x increasing along it
        assert_relative_eq!(x[0], -100.0);
        assert_relative_eq!(x[1], -80.0);
        assert_relative_eq!(y[0], -100.0);
        assert_relative_eq!(y[nx], -80.0);

        let expected = compute_footprint(&grass().to_input().unwrap(), &options(nx).into()).unwrap();
        assert_eq!(f[3 * nx + 5], expected.f[(3, 5)]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let (mut x, mut y, mut f) = (vec![0.0; 10], vec![0.0; 10], vec![0.0; 10]);
        let code = unsafe {
            ffp_compute_footprint(
                &grass(),
                &options(11),
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                f.as_mut_ptr(),
                10,
            )
        };
        assert_eq!(code, FfpErrorCode::InvalidParameter);
        assert_eq!(ffp_get_last_error_code(), FfpErrorCode::InvalidParameter);
    }

    #[test]
    fn invalid_observation_maps_to_input_error() {
        let nx = 5;
        let (mut x, mut y, mut f) = (vec![0.0; 25], vec![0.0; 25], vec![0.0; 25]);
        let bad = FfpInput {
            ustar: 0.01,
            ..grass()
        };
        let code = unsafe {
            ffp_compute_footprint(
                &bad,
                &options(nx),
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                f.as_mut_ptr(),
                25,
            )
        };
        assert_eq!(code, FfpErrorCode::InvalidInput);

        let both = FfpInput {
            umean: 3.0,
            ..grass()
        };
        let code = unsafe {
            ffp_compute_footprint(
                &both,
                &options(nx),
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                f.as_mut_ptr(),
                25,
            )
        };
        assert_eq!(code, FfpErrorCode::InvalidInput);
    }

    #[test]
    fn climatology_counts_valid_members() {
        let nx = 9;
        let (mut x, mut y, mut f) = (vec![0.0; 81], vec![0.0; 81], vec![0.0; 81]);
        let mut n_valid = 0usize;
        let series = [
            grass(),
            FfpInput {
                sigmav: 0.0,
                ..grass()
            },
            grass(),
        ];
        let code = unsafe {
            ffp_compute_climatology(
                series.as_ptr(),
                series.len(),
                &options(nx),
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                f.as_mut_ptr(),
                81,
                &mut n_valid,
            )
        };
        assert_eq!(code, FfpErrorCode::Ok);
        assert_eq!(n_valid, 2);
    }

    #[test]
    fn empty_climatology_has_no_footprints() {
        let (mut x, mut y, mut f) = (vec![0.0; 81], vec![0.0; 81], vec![0.0; 81]);
        let mut n_valid = 0usize;
        let bad = [FfpInput {
            h: 5.0,
            ..grass()
        }];
        let code = unsafe {
            ffp_compute_climatology(
                bad.as_ptr(),
                1,
                &options(9),
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                f.as_mut_ptr(),
                81,
                &mut n_valid,
            )
        };
        assert_eq!(code, FfpErrorCode::NoValidFootprints);
    }
}
