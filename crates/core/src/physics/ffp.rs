//! Flux Footprint Prediction (FFP) parameterisation
//!
//! Implements the two-dimensional footprint of Kljun et al. (2015). The
//! footprint is the product of a crosswind-integrated footprint, a function of
//! the scaled upwind distance only, and a Gaussian crosswind distribution:
//!
//! ```text
//! X* = ρ·cosθ / zm · (1 − zm/h) / D            D = ln(zm/z0) − ψ_m   (roughness)
//!                                             D = umean/u* · κ      (wind speed)
//! F* = a · (X* − d)^b · exp(−c / (X* − d))     for X* > d, else 0
//! f_ci = F* / zm · (1 − zm/h) / D
//! σy* = ac · sqrt(bc · X*² / (1 + cc·X*))
//! σy = σy* / p · zm · σv / u*
//! f(x, y) = f_ci / (sqrt(2π)·σy) · exp(−(ρ·sinθ)² / (2σy²))
//! ```
//!
//! Every division is guarded so that the field is finite and non-negative:
//! receptors with `X* ≤ d` are exactly zero, a non-positive stability-corrected
//! log denominator zeroes `f_ci`, and a non-positive `σy` zeroes the density.
//!
//! # References
//!
//! - Kljun, N., Calanca, P., Rotach, M.W., Schmid, H.P. (2015). "A simple
//!   two-dimensional parameterisation for Flux Footprint Prediction (FFP)."
//!   Geosci. Model Dev., 8, 3695-3713.

use crate::core_types::{FootprintField, FootprintInput, WindProfile};
use crate::error::FootprintResult;
use crate::grid::{to_polar, GridDomain};
use crate::physics::stability::{psi_m, OLN};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Fitted FFP model constants.
pub mod constants {
    /// Crosswind-integrated footprint amplitude
    pub const A: f64 = 1.4524;
    /// Crosswind-integrated footprint exponent
    pub const B: f64 = -1.9914;
    /// Crosswind-integrated footprint decay
    pub const C: f64 = 1.4622;
    /// Scaled upwind distance below which the footprint vanishes
    pub const D: f64 = 0.1359;

    /// Crosswind dispersion amplitude
    pub const AC: f64 = 2.17;
    /// Crosswind dispersion numerator coefficient
    pub const BC: f64 = 1.66;
    /// Crosswind dispersion denominator coefficient
    pub const CC: f64 = 20.0;

    /// von Kármán constant
    pub const KARMAN: f64 = 0.4;

    /// Obukhov length substituted when `|L|` exceeds the near-neutral limit
    pub const OL_CAP: f64 = -1e6;

    /// Dispersion scale offset in unstable conditions
    pub const K_UNSTABLE: f64 = 0.80;
    /// Dispersion scale offset in stable conditions
    pub const K_STABLE: f64 = 0.55;
}

use constants::{A, AC, B, BC, C, CC, D, KARMAN, K_STABLE, K_UNSTABLE, OL_CAP};

/// Scaled crosswind-integrated footprint `F*(X*)`; zero for `X* ≤ d`.
///
/// Evaluated as `a·exp(b·ln(X*−d) − c/(X*−d))`, which equals the published
/// form but cannot produce `∞·0` just above the threshold.
#[inline]
pub fn scaled_crosswind_integrated(xstar: f64) -> f64 {
    if !(xstar > D) {
        return 0.0;
    }
    let u = xstar - D;
    A * (B * u.ln() - C / u).exp()
}

/// Scaled crosswind dispersion `σy*(X*)`.
#[inline]
pub fn scaled_crosswind_dispersion(xstar: f64) -> f64 {
    AC * (BC * xstar * xstar / (1.0 + CC * xstar)).sqrt()
}

/// Dispersion scale constant `p = min(1, 1e-5·|zm/L|⁻¹ + k)`.
///
/// `|L| > L_n` is replaced by [`constants::OL_CAP`] to avoid overflow.
pub fn dispersion_scale_constant(zm: f64, ol: f64) -> f64 {
    let ol_calc = if ol.abs() > OLN { OL_CAP } else { ol };
    let k = if ol_calc <= 0.0 { K_UNSTABLE } else { K_STABLE };
    (1e-5 * (zm / ol_calc).abs().recip() + k).min(1.0)
}

/// Per-observation terms of the FFP model, precomputed once per field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintKernel {
    zm: f64,
    /// `1 − zm/h`
    h_factor: f64,
    /// Normalising denominator `D` shared by `X*` and `f_ci`
    denominator: f64,
    /// False when the stability-corrected log denominator is not positive
    ci_defined: bool,
    /// `zm · σv / u* / p`
    sigma_scale: f64,
    wind_dir: Option<f64>,
}

impl FootprintKernel {
    /// Precompute model terms. The input is assumed to be validated.
    pub fn new(input: &FootprintInput) -> Self {
        let (denominator, ci_defined) = match input.profile {
            WindProfile::Roughness { z0 } => {
                let denom = (input.zm / z0).ln() - psi_m(input.zm, input.ol);
                (denom, denom > 0.0)
            }
            WindProfile::WindSpeed { umean } => (umean / input.ustar * KARMAN, true),
        };
        let scale = dispersion_scale_constant(input.zm, input.ol);
        Self {
            zm: input.zm,
            h_factor: 1.0 - input.zm / input.h,
            denominator,
            ci_defined,
            sigma_scale: input.zm * input.sigmav / input.ustar / scale,
            wind_dir: input.wind_dir,
        }
    }

    /// Scaled upwind distance `X*` at polar position `(ρ, θ)`.
    #[inline]
    pub fn xstar(&self, rho: f64, theta: f64) -> f64 {
        rho * theta.cos() / self.zm * self.h_factor / self.denominator
    }

    /// Real-scale crosswind-integrated footprint `f_ci`.
    #[inline]
    pub fn crosswind_integrated(&self, xstar: f64) -> f64 {
        if !self.ci_defined {
            return 0.0;
        }
        scaled_crosswind_integrated(xstar) / self.zm * self.h_factor / self.denominator
    }

    /// Real-scale crosswind dispersion `σy` (m).
    #[inline]
    pub fn crosswind_dispersion(&self, xstar: f64) -> f64 {
        scaled_crosswind_dispersion(xstar) * self.sigma_scale
    }

    /// Footprint density at polar position `(ρ, θ)`.
    pub fn density(&self, rho: f64, theta: f64) -> f64 {
        let xstar = self.xstar(rho, theta);
        if !(xstar > D) {
            return 0.0;
        }
        let sigy = self.crosswind_dispersion(xstar);
        if !(sigy > 0.0) {
            return 0.0;
        }
        let crosswind = rho * theta.sin();
        let value = self.crosswind_integrated(xstar) / ((2.0 * std::f64::consts::PI).sqrt() * sigy)
            * (-(crosswind * crosswind) / (2.0 * sigy * sigy)).exp();
        if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        }
    }

    /// Footprint density at sensor-relative offset `(dx, dy)`.
    #[inline]
    pub fn density_at_offset(&self, dx: f64, dy: f64) -> f64 {
        let (rho, theta) = to_polar(dx, dy, self.wind_dir);
        self.density(rho, theta)
    }

    /// Scaled upwind distance at sensor-relative offset `(dx, dy)`.
    #[inline]
    pub fn xstar_at_offset(&self, dx: f64, dy: f64) -> f64 {
        let (rho, theta) = to_polar(dx, dy, self.wind_dir);
        self.xstar(rho, theta)
    }
}

/// Evaluate `point(dx, dy)` on every receptor, rows in parallel.
fn evaluate<F>(grid: &GridDomain, point: F) -> DMatrix<f64>
where
    F: Fn(f64, f64) -> f64 + Sync,
{
    let n = grid.nx();
    let point = &point;
    let values: Vec<f64> = (0..n)
        .into_par_iter()
        .flat_map_iter(|row| {
            (0..n).map(move |col| {
                let (dx, dy) = grid.offset(row, col);
                point(dx, dy)
            })
        })
        .collect();
    DMatrix::from_row_slice(n, n, &values)
}

/// Unsmoothed footprint density of an already validated input.
pub(crate) fn density_matrix(input: &FootprintInput, grid: &GridDomain) -> DMatrix<f64> {
    let kernel = FootprintKernel::new(input);
    evaluate(grid, |dx, dy| kernel.density_at_offset(dx, dy))
}

/// Compute the unsmoothed footprint field of one observation.
///
/// # Errors
/// Returns [`FootprintError::InvalidInput`](crate::FootprintError::InvalidInput)
/// if the observation fails validation.
pub fn compute_field(input: &FootprintInput, grid: &GridDomain) -> FootprintResult<FootprintField> {
    input.validate()?;
    let f = density_matrix(input, grid);
    let (x, y) = grid.mesh();
    FootprintField::new(x, y, f)
}

/// Scaled upwind distance `X*` on every receptor.
///
/// # Errors
/// Returns [`FootprintError::InvalidInput`](crate::FootprintError::InvalidInput)
/// if the observation fails validation.
pub fn scaled_upwind_distance(
    input: &FootprintInput,
    grid: &GridDomain,
) -> FootprintResult<DMatrix<f64>> {
    input.validate()?;
    let kernel = FootprintKernel::new(input);
    Ok(evaluate(grid, |dx, dy| kernel.xstar_at_offset(dx, dy)))
}
