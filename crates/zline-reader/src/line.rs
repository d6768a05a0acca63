use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::str::Utf8Error;

use crate::error::ReaderError;

/// One decoded record, terminator stripped, owned by the caller.
///
/// A `Line` is moved out of [`LineReader::next_line`](crate::LineReader::next_line)
/// and the reader keeps no reference to it. The bytes are freed exactly
/// once, whichever comes first:
///
/// ```text
///   drop(line)          → freed implicitly
///   line.into_bytes()   → allocation handed over as Vec<u8>
///   line.release()      → freed now; the Line is tagged released and a
///                         second release() is ReaderError::DoubleRelease
/// ```
///
/// A released line reads as empty.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Line {
    bytes: Vec<u8>,
    released: bool,
}

impl Line {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            released: false,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow the line as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns the [`Utf8Error`] if the line is not valid UTF-8. Lines are
    /// raw bytes; no encoding is assumed while splitting.
    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }

    #[must_use]
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Take ownership of the underlying allocation.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Free the line's bytes now and tag it released.
    ///
    /// Returns the number of bytes freed.
    ///
    /// # Errors
    ///
    /// [`ReaderError::DoubleRelease`] if the line was already released.
    pub fn release(&mut self) -> Result<usize, ReaderError> {
        if self.released {
            return Err(ReaderError::DoubleRelease);
        }
        let len = self.bytes.len();
        self.bytes = Vec::new();
        self.released = true;
        Ok(len)
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Deref for Line {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Line {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq<[u8]> for Line {
    fn eq(&self, other: &[u8]) -> bool {
        self.bytes == other
    }
}

impl PartialEq<&str> for Line {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.released {
            f.write_str("Line(<released>)")
        } else {
            write!(f, "Line({:?})", self.to_string_lossy())
        }
    }
}
