mod context;
mod error;
mod types;

pub use context::*;
pub use error::*;
pub use types::*;

use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::panic::AssertUnwindSafe;

/// Execute a closure that returns an `SEStatus`, catching any panics
/// and converting them into `SEStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> SEStatus>(f: F) -> SEStatus {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            SEStatus::ErrorInternal
        }
    }
}

/// Element count of a rows×cols matrix whose dimensions came from C.
fn element_count(rows: c_int, cols: c_int) -> Option<usize> {
    let rows = usize::try_from(rows).ok().filter(|&r| r > 0)?;
    let cols = usize::try_from(cols).ok().filter(|&c| c > 0)?;
    rows.checked_mul(cols)
}

/// True when the `a_len` doubles at `a` share memory with the `b_len` doubles at `b`.
fn overlaps(a: *const f64, a_len: usize, b: *const f64, b_len: usize) -> bool {
    let (a_start, b_start) = (a as usize, b as usize);
    let a_end = a_start.saturating_add(a_len.saturating_mul(std::mem::size_of::<f64>()));
    let b_end = b_start.saturating_add(b_len.saturating_mul(std::mem::size_of::<f64>()));
    a_start < b_end && b_start < a_end
}

/// Create a new Strassen engine.
///
/// `leaf_size` and `num_threads` may be 0 to keep the library defaults
/// (leaf size 64, one worker per logical CPU). On success, writes a
/// heap-allocated `SEEngine` pointer into `*engine_out`; the caller must later
/// call `se_engine_destroy` to free it.
#[no_mangle]
pub unsafe extern "C" fn se_engine_create(
    leaf_size: usize,
    num_threads: usize,
    engine_out: *mut *mut SEEngine,
) -> SEStatus {
    catch_panic(|| {
        if engine_out.is_null() {
            set_last_error("engine_out is null".to_string());
            return SEStatus::ErrorInvalidArgument;
        }
        match SEEngine::new(leaf_size, num_threads) {
            Ok(engine) => {
                unsafe { *engine_out = Box::into_raw(Box::new(engine)) };
                SEStatus::Ok
            }
            Err(e) => report("failed to create engine", &e),
        }
    })
}

/// Destroy an engine previously created by `se_engine_create`.
///
/// Passing a null pointer is a no-op and returns `SEStatus::Ok`.
#[no_mangle]
pub unsafe extern "C" fn se_engine_destroy(engine: *mut SEEngine) -> SEStatus {
    if engine.is_null() {
        return SEStatus::Ok;
    }
    drop(Box::from_raw(engine));
    SEStatus::Ok
}

/// Multiply `a` (n×k) by `b` (kb×m) into `out` (n×m), all row-major.
///
/// `kb` is the row count of `b` and must equal `k`. Dimensions that are not
/// positive, or that disagree, return `SEStatus::ErrorInvalidDimension`
/// without touching `out`.
///
/// # Safety
/// `a` must point to `n*k` readable doubles, `b` to `k*m`, and `out` to `n*m`
/// writable doubles. `out` must not overlap `a` or `b`: in-place use is
/// rejected with `SEStatus::ErrorInvalidArgument`.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn se_multiply(
    engine: *const SEEngine,
    a: *const f64,
    n: c_int,
    k: c_int,
    b: *const f64,
    kb: c_int,
    m: c_int,
    out: *mut f64,
) -> SEStatus {
    catch_panic(|| {
        if engine.is_null() || a.is_null() || b.is_null() || out.is_null() {
            set_last_error("null argument".to_string());
            return SEStatus::ErrorInvalidArgument;
        }
        if k != kb {
            set_last_error(format!(
                "inner dimension mismatch: A has {} columns but B has {} rows",
                k, kb
            ));
            return SEStatus::ErrorInvalidDimension;
        }
        let (a_len, b_len, out_len) =
            match (element_count(n, k), element_count(k, m), element_count(n, m)) {
                (Some(a_len), Some(b_len), Some(out_len)) => (a_len, b_len, out_len),
                _ => {
                    set_last_error(format!("invalid dimensions: n={}, k={}, m={}", n, k, m));
                    return SEStatus::ErrorInvalidDimension;
                }
            };
        if overlaps(out, out_len, a, a_len) || overlaps(out, out_len, b, b_len) {
            set_last_error("out overlaps an input matrix".to_string());
            return SEStatus::ErrorInvalidArgument;
        }

        let engine = unsafe { &(*engine).engine };
        let a = unsafe { std::slice::from_raw_parts(a, a_len) };
        let b = unsafe { std::slice::from_raw_parts(b, b_len) };
        let out = unsafe { std::slice::from_raw_parts_mut(out, out_len) };

        // element_count guarantees all three are positive.
        match engine.multiply(a, b, n as usize, k as usize, m as usize, out) {
            Ok(()) => SEStatus::Ok,
            Err(e) => report("multiply failed", &e),
        }
    })
}

/// Release the scratch buffers the engine's workers keep between calls.
#[no_mangle]
pub unsafe extern "C" fn se_engine_release_scratch(engine: *const SEEngine) -> SEStatus {
    catch_panic(|| {
        if engine.is_null() {
            set_last_error("engine is null".to_string());
            return SEStatus::ErrorInvalidArgument;
        }
        unsafe { (*engine).engine.release_scratch() };
        SEStatus::Ok
    })
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error, or
/// null if no error has occurred. The caller must free the returned string
/// with `se_free_string`.
#[no_mangle]
pub extern "C" fn se_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `se_last_error`.
#[no_mangle]
pub unsafe extern "C" fn se_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
