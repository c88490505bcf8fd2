//! Operating-system collaborators
//!
//! Small wrappers around the pieces of process state a report needs: the
//! current error code, its human-readable text, and the program name.

use std::path::Path;

/// The calling thread's last OS error code, or 0 if none is recorded
pub fn last_errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Human-readable description of an OS error code
///
/// Unix platforms use `strerror_r`, so the text matches what other tools on
/// the system print for the same code.
#[cfg(unix)]
pub fn os_error_string(errnum: i32) -> String {
    use std::ffi::CStr;

    let mut buf = [0 as libc::c_char; 256];
    // SAFETY: `buf` is writable for `buf.len()` bytes and the XSI
    // `strerror_r` NUL-terminates whatever it writes on success.
    let rc = unsafe { libc::strerror_r(errnum, buf.as_mut_ptr(), buf.len()) };
    if rc != 0 {
        return format!("Unknown error {}", errnum);
    }

    // SAFETY: see above; the buffer holds a NUL-terminated string.
    let text = unsafe { CStr::from_ptr(buf.as_ptr()) };
    text.to_string_lossy().into_owned()
}

/// Human-readable description of an OS error code
#[cfg(not(unix))]
pub fn os_error_string(errnum: i32) -> String {
    let text = std::io::Error::from_raw_os_error(errnum).to_string();
    let suffix = format!(" (os error {})", errnum);
    match text.strip_suffix(&suffix) {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Display name of the running program (file name of `argv[0]`)
pub fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}
