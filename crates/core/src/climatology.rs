//! Footprint climatology over a series of observations
//!
//! The climatology is the mean footprint of every observation that validates.
//! Members are evaluated in parallel and folded into a running sum; a failing
//! member is recorded as a [`SkippedInput`] and excluded from the mean, never
//! zero-filled and never fatal to the batch.

use crate::core_types::{ClimatologyResult, FootprintField, FootprintInput, SkippedInput};
use crate::error::{FootprintError, FootprintResult};
use crate::footprint::FootprintOptions;
use crate::grid::{smooth, GridDomain};
use crate::physics::ffp::density_matrix;
use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::{debug, warn};

/// Partial sum carried through the fold.
struct Accumulator {
    sum: DMatrix<f64>,
    n: usize,
    skipped: Vec<SkippedInput>,
}

impl Accumulator {
    fn empty(nx: usize) -> Self {
        Self {
            sum: DMatrix::zeros(nx, nx),
            n: 0,
            skipped: Vec::new(),
        }
    }

    fn add(mut self, index: usize, input: &FootprintInput, grid: &GridDomain) -> Self {
        match input.validate() {
            Ok(()) => {
                self.sum += density_matrix(input, grid);
                self.n += 1;
            }
            Err(reason) => {
                warn!(index, %reason, "Skipping footprint input");
                self.skipped.push(SkippedInput {
                    index,
                    reason: reason.into(),
                });
            }
        }
        self
    }

    fn merge(mut self, other: Self) -> Self {
        self.sum += other.sum;
        self.n += other.n;
        self.skipped.extend(other.skipped);
        self
    }
}

/// Average the footprints of a series of observations.
///
/// # Errors
/// Returns [`FootprintError::NoValidFootprints`] if no member validates, or
/// [`FootprintError::InvalidGrid`] for unusable grid options.
pub fn compute_footprint_climatology(
    inputs: &[FootprintInput],
    options: &FootprintOptions,
) -> FootprintResult<ClimatologyResult> {
    let grid = options.grid()?;
    aggregate(inputs, &grid, options.smooth)
}

/// Average over a prepared grid.
///
/// # Errors
/// Returns [`FootprintError::NoValidFootprints`] if no member validates.
pub fn aggregate(
    inputs: &[FootprintInput],
    grid: &GridDomain,
    smooth_result: bool,
) -> FootprintResult<ClimatologyResult> {
    let nx = grid.nx();
    let acc = inputs
        .par_iter()
        .enumerate()
        .fold(
            || Accumulator::empty(nx),
            |acc, (index, input)| acc.add(index, input, grid),
        )
        .reduce(|| Accumulator::empty(nx), Accumulator::merge);

    if acc.n == 0 {
        return Err(FootprintError::NoValidFootprints);
    }

    let mut skipped = acc.skipped;
    skipped.sort_by_key(|s| s.index);
    debug!(
        contributing = acc.n,
        skipped = skipped.len(),
        "Footprint climatology aggregated"
    );

    let mut fclim = acc.sum / acc.n as f64;
    if smooth_result {
        fclim = smooth(&fclim);
    }
    let (x, y) = grid.mesh();
    Ok(ClimatologyResult {
        field: FootprintField::new(x, y, fclim)?,
        n: acc.n,
        skipped,
    })
}
