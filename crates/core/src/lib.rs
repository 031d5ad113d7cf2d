//! Flux Footprint Prediction Core Library
//!
//! Computes flux footprints after Kljun et al. (2015): the probability density
//! describing which upwind surface area contributes to a flux measured at a
//! point sensor.
//!
//! ## Components
//!
//! - Input validation of micrometeorological observations
//! - Receptor grids and sensor-relative polar coordinates
//! - Monin-Obukhov stability correction and the FFP parameterisation
//! - Kernel smoothing and climatologies over observation series
//! - Georeferencing through a metric working CRS (WGS84 / UTM built in)
//! - Footprint-weighted averages of external raster grids
//!
//! ```no_run
//! use ffp_core::{compute_footprint, FootprintInput, FootprintOptions};
//!
//! let input = FootprintInput::roughness_based(2.0, 0.02, 1000.0, -50.0, 0.5, 0.3, Some(0.0));
//! let field = compute_footprint(&input, &FootprintOptions::default())?;
//! println!("peak at {:?}", field.peak());
//! # Ok::<(), ffp_core::FootprintError>(())
//! ```

// Core types and errors
pub mod core_types;
pub mod error;

// Model
pub mod grid;
pub mod physics;

// Entry points
pub mod climatology;
pub mod footprint;

// Geospatial adapters
pub mod geo;
pub mod raster;

// Re-export core types
pub use core_types::{
    validate, ClimatologyResult, FieldPeak, FootprintField, FootprintInput, RawObservation,
    SkippedInput, WindProfile,
};
pub use error::{CrsError, FootprintError, FootprintResult, InputError, RasterError};

// Re-export model types
pub use grid::{Domain, GridDomain};
pub use physics::{psi_m, FootprintKernel, StabilityRegime};

// Re-export entry points
pub use climatology::compute_footprint_climatology;
pub use footprint::{compute_footprint, FootprintOptions};
pub use geo::{
    compute_georeferenced_footprint, utm_epsg_for, CoordinateSystem, CoordinateTransform,
    CrsTransformer, FootprintConfig, GeoreferencedProcessor, ResolvedConfig,
};
pub use raster::{
    weight_field, weight_raster_by_footprint, weight_raster_source, AffineTransform, RasterGrid,
    RasterSource,
};
