use crate::error::{with_last_error_mut, DefaultFfpError, FfpError, FfpErrorCode};
use ffp_core::FootprintError;
use std::ffi::CString;

/// Set the thread-local error message and code.
pub(crate) fn set_last_error(error: &impl FfpError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl FfpError) -> FfpErrorCode {
    set_last_error(error);
    error.code()
}

/// Record a failed model call, or clear the error state on success.
pub(crate) fn track_result<T>(result: Result<T, FootprintError>) -> Result<T, FfpErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(err) => {
            tracing::debug!(error = %err, "FFI call failed");
            Err(track_error(&DefaultFfpError::from(&err)))
        }
    }
}

/// Clear the thread-local error message and code.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = FfpErrorCode::Ok;
    });
}

/// Borrow `len` values from a caller pointer.
///
/// # Safety
/// `ptr` must be valid for `len` reads, or null.
pub(crate) unsafe fn read_slice<'a, T>(
    ptr: *const T,
    len: usize,
    name: &str,
) -> Result<&'a [T], FfpErrorCode> {
    if ptr.is_null() {
        return Err(track_error(&DefaultFfpError::null_pointer(name)));
    }
    // SAFETY: non-null and valid for `len` reads per the caller contract.
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// Mutably borrow `len` values from a caller pointer.
///
/// # Safety
/// `ptr` must be valid for `len` writes and not aliased, or null.
pub(crate) unsafe fn write_slice<'a, T>(
    ptr: *mut T,
    len: usize,
    name: &str,
) -> Result<&'a mut [T], FfpErrorCode> {
    if ptr.is_null() {
        return Err(track_error(&DefaultFfpError::null_pointer(name)));
    }
    // SAFETY: non-null and valid for `len` writes per the caller contract.
    Ok(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
}

/// Copy `values` into the start of `out`, failing if `out` is too short.
pub(crate) fn copy_into(values: &[f64], out: &mut [f64], name: &str) -> Result<(), FfpErrorCode> {
    if out.len() < values.len() {
        return Err(track_error(&DefaultFfpError::buffer_too_small(
            name,
            out.len(),
            values.len(),
        )));
    }
    out[..values.len()].copy_from_slice(values);
    Ok(())
}
