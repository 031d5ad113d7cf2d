//! Meteorological observation driving one footprint
//!
//! A [`FootprintInput`] carries the handful of scalars the FFP
//! parameterisation needs. The roughness-length and mean-wind-speed
//! formulations are mutually exclusive, so they are expressed as the
//! [`WindProfile`] variant rather than two optional fields.
//!
//! Validation is a gate: [`FootprintInput::validate`] never modifies the
//! record, it only accepts or rejects it.

use crate::error::InputError;
use serde::{Deserialize, Serialize};

/// Lower bound on boundary layer height (m).
pub const MIN_BOUNDARY_LAYER_HEIGHT: f64 = 10.0;

/// Lower bound on friction velocity (m/s).
pub const MIN_FRICTION_VELOCITY: f64 = 0.1;

/// How the scaled upwind distance is normalised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindProfile {
    /// Logarithmic profile from the aerodynamic roughness length `z0` (m).
    Roughness { z0: f64 },
    /// Measured mean wind speed `umean` (m/s) at the measurement height.
    WindSpeed { umean: f64 },
}

/// One footprint observation.
///
/// Serialises as a flat record with optional `z0`/`umean` fields (see
/// [`RawObservation`]); deserialisation rejects records that supply neither
/// or both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawObservation", into = "RawObservation")]
pub struct FootprintInput {
    /// Measurement height above displacement height, z - d (m)
    pub zm: f64,
    /// Roughness- or wind-speed-based profile
    pub profile: WindProfile,
    /// Boundary layer height (m)
    pub h: f64,
    /// Obukhov length (m)
    pub ol: f64,
    /// Standard deviation of lateral velocity fluctuations (m/s)
    pub sigmav: f64,
    /// Friction velocity (m/s)
    pub ustar: f64,
    /// Wind direction (degrees from north), if the field should be rotated
    pub wind_dir: Option<f64>,
}

impl FootprintInput {
    /// Observation using the roughness-length formulation.
    pub fn roughness_based(
        zm: f64,
        z0: f64,
        h: f64,
        ol: f64,
        sigmav: f64,
        ustar: f64,
        wind_dir: Option<f64>,
    ) -> Self {
        Self {
            zm,
            profile: WindProfile::Roughness { z0 },
            h,
            ol,
            sigmav,
            ustar,
            wind_dir,
        }
    }

    /// Observation using the mean-wind-speed formulation.
    pub fn wind_speed_based(
        zm: f64,
        umean: f64,
        h: f64,
        ol: f64,
        sigmav: f64,
        ustar: f64,
        wind_dir: Option<f64>,
    ) -> Self {
        Self {
            zm,
            profile: WindProfile::WindSpeed { umean },
            h,
            ol,
            sigmav,
            ustar,
            wind_dir,
        }
    }

    /// Roughness length, if this observation is roughness-based.
    pub fn z0(&self) -> Option<f64> {
        match self.profile {
            WindProfile::Roughness { z0 } => Some(z0),
            WindProfile::WindSpeed { .. } => None,
        }
    }

    /// Mean wind speed, if this observation is wind-speed-based.
    pub fn umean(&self) -> Option<f64> {
        match self.profile {
            WindProfile::WindSpeed { umean } => Some(umean),
            WindProfile::Roughness { .. } => None,
        }
    }

    /// Check physical admissibility.
    ///
    /// Checks run in a fixed order and the first violation is returned.
    /// Comparisons are written so that NaN fails every check.
    ///
    /// # Errors
    /// Returns the [`InputError`] naming the first violated constraint.
    pub fn validate(&self) -> Result<(), InputError> {
        if !(self.zm > 0.0) {
            return Err(InputError::MeasurementHeight { zm: self.zm });
        }
        if let WindProfile::Roughness { z0 } = self.profile {
            if !(z0 > 0.0) {
                return Err(InputError::RoughnessLength { z0 });
            }
        }
        if !(self.h > MIN_BOUNDARY_LAYER_HEIGHT) {
            return Err(InputError::BoundaryLayerHeight { h: self.h });
        }
        if !(self.zm < self.h) {
            return Err(InputError::MeasurementAboveBoundaryLayer {
                zm: self.zm,
                h: self.h,
            });
        }
        if !(self.sigmav > 0.0) {
            return Err(InputError::LateralVelocityStd {
                sigmav: self.sigmav,
            });
        }
        if !(self.ustar >= MIN_FRICTION_VELOCITY) {
            return Err(InputError::FrictionVelocity { ustar: self.ustar });
        }
        if let Some(wind_dir) = self.wind_dir {
            if !(0.0..=360.0).contains(&wind_dir) {
                return Err(InputError::WindDirection { wind_dir });
            }
        }
        if let WindProfile::WindSpeed { umean } = self.profile {
            if !(umean > 0.0) {
                return Err(InputError::MeanWindSpeed { umean });
            }
        }
        Ok(())
    }
}

/// Validate one observation.
///
/// # Errors
/// See [`FootprintInput::validate`].
pub fn validate(input: &FootprintInput) -> Result<(), InputError> {
    input.validate()
}

/// Flat observation record with optional `z0`/`umean`.
///
/// This is the shape observations arrive in from files and foreign callers.
/// Converting into [`FootprintInput`] selects the wind profile variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub zm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z0: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub umean: Option<f64>,
    pub h: f64,
    pub ol: f64,
    pub sigmav: f64,
    pub ustar: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_dir: Option<f64>,
}

impl TryFrom<RawObservation> for FootprintInput {
    type Error = InputError;

    fn try_from(raw: RawObservation) -> Result<Self, Self::Error> {
        let profile = match (raw.z0, raw.umean) {
            (Some(z0), None) => WindProfile::Roughness { z0 },
            (None, Some(umean)) => WindProfile::WindSpeed { umean },
            _ => return Err(InputError::AmbiguousWindProfile),
        };
        Ok(Self {
            zm: raw.zm,
            profile,
            h: raw.h,
            ol: raw.ol,
            sigmav: raw.sigmav,
            ustar: raw.ustar,
            wind_dir: raw.wind_dir,
        })
    }
}

impl From<FootprintInput> for RawObservation {
    fn from(input: FootprintInput) -> Self {
        Self {
            zm: input.zm,
            z0: input.z0(),
            umean: input.umean(),
            h: input.h,
            ol: input.ol,
            sigmav: input.sigmav,
            ustar: input.ustar,
            wind_dir: input.wind_dir,
        }
    }
}
