//! C interface to the flux footprint model
//!
//! Every function returns an [`FfpErrorCode`]; on failure the message is
//! available through [`ffp_get_last_error`] on the same thread. Results are
//! written into caller-owned, row-major buffers.

mod error;
mod footprint;
mod helpers;
mod processor;
mod raster;

pub use error::{ffp_get_last_error, ffp_get_last_error_code, FfpErrorCode};
pub use footprint::{ffp_compute_climatology, ffp_compute_footprint, FfpInput, FfpOptions};
pub use processor::{
    ffp_processor_compute, ffp_processor_destroy, ffp_processor_grid_size, ffp_processor_new,
    FfpProcessor, FfpProcessorConfig,
};
pub use raster::ffp_weight_raster;
