//! Georeferenced footprints through an opaque processor handle

use crate::error::{DefaultFfpError, FfpErrorCode};
use crate::footprint::{FfpInput, FieldBuffers};
use crate::helpers::{clear_last_error, read_slice, track_error, track_result, write_slice};
use ffp_core::{CoordinateSystem, Domain, FootprintConfig, FootprintResult, GeoreferencedProcessor};
use std::ptr;

/// Georeferencing configuration as passed from C.
///
/// CRSs are given as EPSG codes; `working_epsg = 0` selects the UTM zone of
/// the station when the input CRS is geographic.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfpProcessorConfig {
    /// Half-width of the view extent around the station, input CRS units
    pub origin_distance: f64,
    pub measurement_height: f64,
    pub roughness_length: f64,
    pub domain_xmin: f64,
    pub domain_xmax: f64,
    pub domain_ymin: f64,
    pub domain_ymax: f64,
    /// Receptor spacing in working CRS units
    pub grid_resolution: f64,
    pub station_x: f64,
    pub station_y: f64,
    pub input_epsg: u32,
    pub working_epsg: u32,
}

impl FfpProcessorConfig {
    fn to_config(self) -> FootprintResult<FootprintConfig> {
        let working_crs = match self.working_epsg {
            0 => None,
            code => Some(CoordinateSystem::from_epsg(code)?),
        };
        Ok(FootprintConfig {
            origin_distance: self.origin_distance,
            measurement_height: self.measurement_height,
            roughness_length: self.roughness_length,
            domain_size: Domain::new(
                self.domain_xmin,
                self.domain_xmax,
                self.domain_ymin,
                self.domain_ymax,
            ),
            grid_resolution: self.grid_resolution,
            station_coords: (self.station_x, self.station_y),
            coordinate_system: CoordinateSystem::from_epsg(self.input_epsg)?,
            working_crs,
        })
    }
}

/// Opaque handle around a [`GeoreferencedProcessor`] and its grid size.
pub struct FfpProcessor {
    processor: GeoreferencedProcessor,
    nx: usize,
}

impl FfpProcessor {
    fn new(config: &FfpProcessorConfig) -> FootprintResult<Self> {
        let processor = GeoreferencedProcessor::new(config.to_config()?.resolve()?)?;
        let nx = processor.working_grid()?.nx();
        Ok(Self { processor, nx })
    }
}

/// Create a processor from `config`.
///
/// On success `*out_processor` receives a handle that must be released with
/// `ffp_processor_destroy`. On failure it is set to null.
///
/// # Safety
/// - `config` must point to a valid struct.
/// - `out_processor` must be valid for one write.
#[no_mangle]
pub unsafe extern "C" fn ffp_processor_new(
    config: *const FfpProcessorConfig,
    out_processor: *mut *mut FfpProcessor,
) -> FfpErrorCode {
    if out_processor.is_null() {
        return track_error(&DefaultFfpError::null_pointer("out_processor"));
    }
    // Set to null first so every failure path leaves it null
    unsafe {
        *out_processor = ptr::null_mut();
    }
    let config = match unsafe { read_slice(config, 1, "config") } {
        Ok(config) => config[0],
        Err(code) => return code,
    };

    match track_result(FfpProcessor::new(&config)) {
        Ok(processor) => {
            unsafe {
                *out_processor = Box::into_raw(Box::new(processor));
            }
            FfpErrorCode::Ok
        }
        Err(code) => code,
    }
}

/// Receptor points per side of the processor's working grid.
///
/// Result buffers passed to `ffp_processor_compute` need `nx * nx` values.
///
/// # Safety
/// `processor` must be a live handle from `ffp_processor_new`; `out_nx` must
/// be valid for one write.
#[no_mangle]
pub unsafe extern "C" fn ffp_processor_grid_size(
    processor: *const FfpProcessor,
    out_nx: *mut usize,
) -> FfpErrorCode {
    let Some(processor) = (unsafe { processor.as_ref() }) else {
        return track_error(&DefaultFfpError::null_pointer("processor"));
    };
    match unsafe { write_slice(out_nx, 1, "out_nx") } {
        Ok(out) => {
            out[0] = processor.nx;
            clear_last_error();
            FfpErrorCode::Ok
        }
        Err(code) => code,
    }
}

/// Compute one georeferenced footprint; coordinates are written in the
/// input CRS.
///
/// # Safety
/// - `processor` must be a live handle from `ffp_processor_new`.
/// - `input` must point to a valid struct.
/// - `out_x`, `out_y` and `out_f` must each be valid for `len` writes and must not overlap.
#[no_mangle]
pub unsafe extern "C" fn ffp_processor_compute(
    processor: *const FfpProcessor,
    input: *const FfpInput,
    smooth: u8,
    out_x: *mut f64,
    out_y: *mut f64,
    out_f: *mut f64,
    len: usize,
) -> FfpErrorCode {
    let run = || -> Result<(), FfpErrorCode> {
        let Some(processor) = (unsafe { processor.as_ref() }) else {
            return Err(track_error(&DefaultFfpError::null_pointer("processor")));
        };
        let input = unsafe { read_slice(input, 1, "input")? }[0];
        let required = processor.nx * processor.nx;
        if len < required {
            return Err(track_error(&DefaultFfpError::buffer_too_small(
                "out_f", len, required,
            )));
        }
        let buffers = unsafe { FieldBuffers::new(out_x, out_y, out_f, len)? };

        let field = track_result(input.to_input().and_then(|input| {
            processor
                .processor
                .compute_georeferenced_field_with(&input, smooth != 0)
        }))?;
        buffers.fill(&field)
    };
    run().err().unwrap_or(FfpErrorCode::Ok)
}

/// Destroys a processor previously created by `ffp_processor_new`.
///
/// If `processor` is null, this function is a no-op.
///
/// # Safety
/// - The pointer MUST have been created by `ffp_processor_new`.
/// - The pointer MUST NOT have been freed already.
/// - After calling this function, the caller must not use the pointer again.
#[no_mangle]
pub unsafe extern "C" fn ffp_processor_destroy(processor: *mut FfpProcessor) {
    if processor.is_null() {
        return;
    }

    // SAFETY: created by `Box::into_raw` in `ffp_processor_new` and not yet freed.
    unsafe {
        drop(Box::from_raw(processor));
    }
}
