//! Single-observation footprint entry point

use crate::core_types::{FootprintField, FootprintInput};
use crate::error::FootprintResult;
use crate::grid::{smooth, Domain, GridDomain};
use crate::physics::compute_field;
use serde::{Deserialize, Serialize};

/// Default receptor points per grid side.
pub const DEFAULT_NX: usize = 1000;

/// Grid and post-processing options for footprint computations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintOptions {
    /// Analysis domain relative to the sensor (m)
    pub domain: Domain,
    /// Receptor points per grid side
    pub nx: usize,
    /// Apply two-pass kernel smoothing to the result
    pub smooth: bool,
}

impl Default for FootprintOptions {
    fn default() -> Self {
        Self {
            domain: Domain::default(),
            nx: DEFAULT_NX,
            smooth: true,
        }
    }
}

impl FootprintOptions {
    /// Options with the default domain and `nx` but no smoothing.
    pub fn unsmoothed() -> Self {
        Self {
            smooth: false,
            ..Self::default()
        }
    }

    /// Receptor grid described by these options.
    ///
    /// # Errors
    /// Returns [`FootprintError::InvalidGrid`](crate::FootprintError::InvalidGrid)
    /// for `nx < 2` or a degenerate domain.
    pub fn grid(&self) -> FootprintResult<GridDomain> {
        GridDomain::new(self.domain, self.nx)
    }
}

/// Compute the footprint of one observation.
///
/// # Errors
/// Returns an error if the observation fails validation or the grid options
/// are unusable.
pub fn compute_footprint(
    input: &FootprintInput,
    options: &FootprintOptions,
) -> FootprintResult<FootprintField> {
    let grid = options.grid()?;
    let mut field = compute_field(input, &grid)?;
    if options.smooth {
        field.f = smooth(&field.f);
    }
    Ok(field)
}
