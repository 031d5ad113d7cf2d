//! Monin-Obukhov stability correction for the momentum profile
//!
//! The integrated stability function `ψ_m(zm/L)` corrects the logarithmic
//! wind profile for buoyancy. Following the FFP parameterisation, unstable
//! and very stable conditions share the Businger-Dyer form while moderately
//! stable conditions use the linear form:
//!
//! ```text
//! L ≤ 0 or L ≥ L_n:  x = (1 − 19·zm/L)^¼
//!                    ψ = ln((1+x²)/2) + 2·ln((1+x)/2) − 2·atan(x) + π/2
//! 0 < L < L_n:       ψ = −5.3·zm/L
//! ```
//!
//! # References
//!
//! - Kljun, N. et al. (2015). "A simple two-dimensional parameterisation for
//!   Flux Footprint Prediction (FFP)." Geosci. Model Dev., 8, 3695-3713.

use std::f64::consts::FRAC_PI_2;

/// Obukhov length beyond which conditions are treated as near-neutral (m).
pub const OLN: f64 = 5000.0;

/// Stability regime selected by the Obukhov length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityRegime {
    /// `L ≤ 0`
    Unstable,
    /// `0 < L < L_n`
    Stable,
    /// `L ≥ L_n`, handled with the unstable formula
    NearNeutral,
}

impl StabilityRegime {
    pub fn classify(ol: f64) -> Self {
        if ol <= 0.0 {
            Self::Unstable
        } else if ol >= OLN {
            Self::NearNeutral
        } else {
            Self::Stable
        }
    }
}

/// Integrated momentum stability correction `ψ_m` at height `zm` (m) for
/// Obukhov length `ol` (m).
#[inline]
pub fn psi_m(zm: f64, ol: f64) -> f64 {
    match StabilityRegime::classify(ol) {
        StabilityRegime::Unstable | StabilityRegime::NearNeutral => {
            let xx = (1.0 - 19.0 * zm / ol).powf(0.25);
            ((1.0 + xx * xx) / 2.0).ln() + 2.0 * ((1.0 + xx) / 2.0).ln() - 2.0 * xx.atan()
                + FRAC_PI_2
        }
        StabilityRegime::Stable => -5.3 * zm / ol,
    }
}
