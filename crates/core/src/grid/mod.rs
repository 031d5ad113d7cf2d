//! Receptor grids and field smoothing

pub mod domain;
pub mod smoothing;

pub use domain::{linspace, to_polar, Domain, GridDomain};
pub use smoothing::{smooth, SMOOTHING_KERNEL};
