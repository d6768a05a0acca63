//! C ABI for the zstd line reader.
//!
//! ```text
//!   zline_reader_open   → ZlineReader*            (NULL on failure)
//!   zline_reader_next   → ZlineStatus, fills ZlineLine
//!   zline_line_release  → frees one ZlineLine, zeroes it
//!   zline_reader_close  → frees the reader, nulls the caller's pointer
//! ```
//!
//! Release and close both zero the caller's storage, so a repeated call
//! sees a null pointer and reports `DoubleRelease` / `Closed` instead of
//! freeing twice. A pointer copied before the first call is still
//! dangling afterwards; only the caller's own slot is cleared.

#![warn(clippy::pedantic)]

use std::ffi::{CStr, c_char};
use std::mem::ManuallyDrop;
use std::ptr;

use zline_reader::{FileReader, Line, ReaderError};

/// Status codes shared by every call. Mirrors `ZlineStatus` in `zline.h`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZlineStatus {
    Ok = 0,
    EndOfStream = 1,
    DecodeFailure = -1,
    Failed = -2,
    Closed = -3,
    DoubleRelease = -4,
    InvalidArgument = -5,
    LineTooLong = -6,
    OpenFailure = -7,
}

impl From<&ReaderError> for ZlineStatus {
    fn from(err: &ReaderError) -> Self {
        match err {
            ReaderError::Open { .. } | ReaderError::CodecInit { .. } => Self::OpenFailure,
            ReaderError::Decode { .. } => Self::DecodeFailure,
            ReaderError::LineTooLong { .. } => Self::LineTooLong,
            ReaderError::Failed => Self::Failed,
            ReaderError::Closed => Self::Closed,
            ReaderError::DoubleRelease => Self::DoubleRelease,
            ReaderError::InvalidConfig(_) => Self::InvalidArgument,
        }
    }
}

/// Opaque handle. C code only ever sees a pointer to it.
pub struct ZlineReader {
    inner: FileReader,
}

/// A line handed to C. `data` is NUL-terminated and `len` excludes the NUL.
///
/// `cap` is the size of the allocation behind `data`; C code must not
/// change it.
#[repr(C)]
#[derive(Debug)]
pub struct ZlineLine {
    pub data: *mut c_char,
    pub len: usize,
    pub cap: usize,
}

impl ZlineLine {
    const EMPTY: Self = Self {
        data: ptr::null_mut(),
        len: 0,
        cap: 0,
    };

    /// Hand the line's allocation to C as is. Lines come out of the reader
    /// with spare capacity, so appending the NUL does not move the bytes.
    fn from_line(line: Line) -> Self {
        let mut bytes = ManuallyDrop::new(line.into_bytes());
        let len = bytes.len();
        bytes.push(0);
        Self {
            data: bytes.as_mut_ptr().cast::<c_char>(),
            len,
            cap: bytes.capacity(),
        }
    }
}

/// Open a zstd file for line reading.
///
/// Returns NULL if `path` is NULL or not UTF-8, the file cannot be opened,
/// or it does not start with a zstd frame.
///
/// # Safety
///
/// `path` must be NULL or point to a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zline_reader_open(path: *const c_char) -> *mut ZlineReader {
    if path.is_null() {
        return ptr::null_mut();
    }
    // SAFETY: non-null and NUL-terminated per the contract above.
    let path = unsafe { CStr::from_ptr(path) };
    let Ok(path) = path.to_str() else {
        tracing::warn!("zline_reader_open: path is not UTF-8");
        return ptr::null_mut();
    };

    match FileReader::open(path) {
        Ok(inner) => Box::into_raw(Box::new(ZlineReader { inner })),
        Err(e) => {
            tracing::warn!(path, "zline_reader_open failed: {e}");
            ptr::null_mut()
        }
    }
}

/// Read the next line into `out`.
///
/// On `Ok`, `out` owns a new line that must be passed to
/// [`zline_line_release`]. On any other status `out` is zeroed.
///
/// # Safety
///
/// `reader` must be NULL or a live pointer from [`zline_reader_open`];
/// `out` must point to writable `ZlineLine` storage.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zline_reader_next(
    reader: *mut ZlineReader,
    out: *mut ZlineLine,
) -> ZlineStatus {
    if out.is_null() {
        return ZlineStatus::InvalidArgument;
    }
    // SAFETY: `out` is non-null and writable per the contract.
    unsafe { out.write(ZlineLine::EMPTY) };

    // SAFETY: NULL or a live handle per the contract.
    let Some(reader) = (unsafe { reader.as_mut() }) else {
        return ZlineStatus::Closed;
    };

    match reader.inner.next_line() {
        Ok(Some(line)) => {
            // SAFETY: as above.
            unsafe { out.write(ZlineLine::from_line(line)) };
            ZlineStatus::Ok
        }
        Ok(None) => ZlineStatus::EndOfStream,
        Err(e) => ZlineStatus::from(&e),
    }
}

/// Free a line returned by [`zline_reader_next`] and zero `*line`.
///
/// # Safety
///
/// `line` must be NULL or point to a `ZlineLine` that is either zeroed or
/// was filled by [`zline_reader_next`] and not modified since.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zline_line_release(line: *mut ZlineLine) -> ZlineStatus {
    // SAFETY: NULL or valid per the contract.
    let Some(line) = (unsafe { line.as_mut() }) else {
        return ZlineStatus::InvalidArgument;
    };
    if line.data.is_null() {
        return ZlineStatus::DoubleRelease;
    }

    // SAFETY: `data`/`len`/`cap` come from `ZlineLine::from_line`, which
    // leaked a `Vec<u8>` of length `len + 1` and capacity `cap`.
    drop(unsafe { Vec::from_raw_parts(line.data.cast::<u8>(), line.len + 1, line.cap) });
    *line = ZlineLine::EMPTY;
    ZlineStatus::Ok
}

/// Close the reader behind `*reader`, free it and set `*reader` to NULL.
///
/// # Safety
///
/// `reader` must point to a slot holding NULL or a live pointer from
/// [`zline_reader_open`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zline_reader_close(reader: *mut *mut ZlineReader) -> ZlineStatus {
    // SAFETY: valid slot per the contract.
    let Some(slot) = (unsafe { reader.as_mut() }) else {
        return ZlineStatus::InvalidArgument;
    };
    if slot.is_null() {
        return ZlineStatus::Closed;
    }

    // SAFETY: a live pointer from `zline_reader_open`, not yet freed
    // because freeing always clears the slot.
    let mut handle = unsafe { Box::from_raw(*slot) };
    *slot = ptr::null_mut();

    match handle.inner.close() {
        Ok(()) => ZlineStatus::Ok,
        Err(e) => ZlineStatus::from(&e),
    }
}
