use ffp_core::FootprintError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// `code()` is what crosses the FFI boundary; `msg()` is kept for
/// `ffp_get_last_error`.
pub(crate) trait FfpError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> FfpErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `FfpError` for FFI error scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultFfpError {
    code: FfpErrorCode,
    msg: String,
}

impl DefaultFfpError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_f"`, `"inputs"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: FfpErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for invalid parameter.
    ///
    /// # Arguments
    /// * `message` - Description of the error
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: FfpErrorCode::InvalidParameter,
            msg: message,
        }
    }

    /// Create error for a caller buffer shorter than the result.
    pub fn buffer_too_small(param_name: &str, len: usize, required: usize) -> Self {
        Self::invalid_parameter(format!(
            "Buffer '{param_name}' holds {len} values, {required} required"
        ))
    }
}

impl FfpError for DefaultFfpError {
    fn code(&self) -> FfpErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

impl From<&FootprintError> for DefaultFfpError {
    fn from(error: &FootprintError) -> Self {
        let code = match error {
            FootprintError::InvalidInput(_) => FfpErrorCode::InvalidInput,
            FootprintError::NoValidFootprints => FfpErrorCode::NoValidFootprints,
            FootprintError::InvalidGrid(_) => FfpErrorCode::InvalidGrid,
            FootprintError::InvalidConfig(_) => FfpErrorCode::InvalidConfig,
            FootprintError::Crs(_) => FfpErrorCode::Crs,
            FootprintError::Raster(_) => FfpErrorCode::Raster,
        };
        Self {
            code,
            msg: error.to_string(),
        }
    }
}

/// FFI error codes returned by footprint functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfpErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Invalid parameter passed to function (buffer sizes, flags, counts).
    InvalidParameter = 2,

    /// An observation failed validation.
    InvalidInput = 3,

    /// No observation in a climatology series produced a footprint.
    NoValidFootprints = 4,

    /// Receptor grid could not be built from the requested domain.
    InvalidGrid = 5,

    /// Georeferencing configuration is unusable.
    InvalidConfig = 6,

    /// Coordinate reference system unsupported or out of range.
    Crs = 7,

    /// Raster grid malformed or unreadable.
    Raster = 8,
}

impl From<DefaultFfpError> for FfpErrorCode {
    fn from(error: DefaultFfpError) -> Self {
        error.code
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    static LAST_ERROR: RefCell<(Option<CString>, FfpErrorCode)> = const { RefCell::new((None, FfpErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, FfpErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, FfpErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if an error occurred.
/// - `null` if the last call succeeded or the message cannot be converted to a C string.
///
/// # Thread Safety
/// Error messages are stored per-thread, so each thread has its own error state.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread that
/// sets or clears the error.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```c
/// FfpErrorCode err = ffp_compute_footprint(&input, &options, x, y, f, len);
/// if (err != Ok) {
///     const char* error = ffp_get_last_error();
///     if (error) {
///         printf("Footprint failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn ffp_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code.
///
/// Returns `FfpErrorCode::Ok` (0) if the last call on this thread succeeded.
#[no_mangle]
pub extern "C" fn ffp_get_last_error_code() -> FfpErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
