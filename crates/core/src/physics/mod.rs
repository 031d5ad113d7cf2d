//! Footprint physics: stability correction and the FFP parameterisation

pub mod ffp;
pub mod stability;

pub use ffp::{compute_field, constants, scaled_upwind_distance, FootprintKernel};
pub use stability::{psi_m, StabilityRegime, OLN};
