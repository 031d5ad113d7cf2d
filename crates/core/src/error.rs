//! Error types for footprint computation
//!
//! Errors are split by the layer that raises them:
//!
//! - [`InputError`]: a single observation violates a physical admissibility
//!   constraint. Fatal to one footprint, non-fatal inside a climatology batch.
//! - [`CrsError`]: a coordinate reference system could not be parsed or
//!   transformed. Propagated to the caller unchanged.
//! - [`RasterError`]: an external raster grid is malformed or unreadable.
//! - [`FootprintError`]: umbrella type returned by the public operations.
//!
//! Numerical guard conditions (degenerate stability denominators, receptor
//! points below the model threshold, zero raster weights) are not errors; they
//! are neutralised to `0` at the point where they occur.

use thiserror::Error;

/// Result alias used by the public footprint operations.
pub type FootprintResult<T> = Result<T, FootprintError>;

/// A violated physical constraint on a [`FootprintInput`](crate::FootprintInput).
///
/// `AmbiguousWindProfile` is raised at construction; the remaining variants are
/// listed in validation order and the first failing check wins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Neither or both of `z0` and `umean` were supplied.
    #[error("exactly one of roughness length z0 or mean wind speed umean must be supplied")]
    AmbiguousWindProfile,

    /// `zm` must be strictly positive.
    #[error("measurement height zm must be positive, got {zm}")]
    MeasurementHeight { zm: f64 },

    /// `z0` must be strictly positive when the roughness-based profile is used.
    #[error("roughness length z0 must be positive, got {z0}")]
    RoughnessLength { z0: f64 },

    /// `h` must exceed 10 m.
    #[error("boundary layer height h must be > 10 m, got {h}")]
    BoundaryLayerHeight { h: f64 },

    /// `zm` must lie below the boundary layer height.
    #[error("measurement height zm ({zm}) must be below boundary layer height h ({h})")]
    MeasurementAboveBoundaryLayer { zm: f64, h: f64 },

    /// `sigmav` must be strictly positive.
    #[error("lateral velocity standard deviation sigmav must be positive, got {sigmav}")]
    LateralVelocityStd { sigmav: f64 },

    /// `ustar` must be at least 0.1 m/s.
    #[error("friction velocity ustar must be >= 0.1 m/s, got {ustar}")]
    FrictionVelocity { ustar: f64 },

    /// `wind_dir` must lie in `[0, 360]` degrees when present.
    #[error("wind direction must be between 0 and 360 degrees, got {wind_dir}")]
    WindDirection { wind_dir: f64 },

    /// `umean` must be strictly positive when the wind-speed-based profile is used.
    #[error("mean wind speed umean must be positive, got {umean}")]
    MeanWindSpeed { umean: f64 },
}

/// Coordinate reference system failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrsError {
    /// EPSG code outside the set the built-in provider understands.
    #[error("unsupported EPSG code: {code}")]
    UnsupportedEpsg { code: u32 },

    /// Definition string could not be parsed.
    #[error("failed to parse CRS definition '{definition}': {reason}")]
    Parse { definition: String, reason: String },

    /// The built-in transform provider cannot transform between these systems.
    #[error("no coordinate transform available from '{source_crs}' to '{target_crs}'")]
    UnsupportedCrs {
        source_crs: String,
        target_crs: String,
    },

    /// A coordinate fell outside the valid range of a projection.
    #[error("{what} out of range: {value:.6} (allowed {min} to {max})")]
    OutOfRange {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// External raster grid failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RasterError {
    /// The value buffer does not match the declared dimensions.
    #[error("raster value count {len} does not match {rows}x{cols} grid")]
    Shape { rows: usize, cols: usize, len: usize },

    /// Footprint sample matrices passed for weighting differ in shape.
    #[error("sample shapes differ: x {x:?}, y {y:?}, f {f:?}")]
    SampleShape {
        x: (usize, usize),
        y: (usize, usize),
        f: (usize, usize),
    },

    /// The affine transform cannot be inverted.
    #[error("raster affine transform is degenerate (determinant {determinant})")]
    DegenerateTransform { determinant: f64 },

    /// Reprojection was requested for a raster that carries no CRS.
    #[error("raster has no coordinate reference system")]
    MissingCrs,

    /// The raster provider failed to produce a grid.
    #[error("failed to read raster '{path}': {message}")]
    Source { path: String, message: String },

    /// Reprojection of the raster bounds failed.
    #[error(transparent)]
    Reprojection(#[from] CrsError),
}

/// Umbrella error for the public footprint operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FootprintError {
    /// The observation failed validation.
    #[error("invalid footprint input: {0}")]
    InvalidInput(#[from] InputError),

    /// A climatology series produced no valid footprint.
    #[error("no valid footprints calculated")]
    NoValidFootprints,

    /// Grid dimensions or domain bounds are unusable.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Georeferencing configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Coordinate reference system failure.
    #[error(transparent)]
    Crs(#[from] CrsError),

    /// Raster failure.
    #[error(transparent)]
    Raster(#[from] RasterError),
}
