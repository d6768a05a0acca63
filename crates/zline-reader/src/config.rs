use crate::error::ReaderError;

/// Default chunk buffer size: one 64 KiB read unit.
pub const DEFAULT_CHUNK_CAPACITY: usize = 0x10000;

/// Construction-time settings for a [`LineReader`](crate::LineReader).
///
/// ```text
/// ┌────────────────┬───────────────┬──────────────────────────────────────┐
/// │ Field          │ Default       │ Purpose                              │
/// ├────────────────┼───────────────┼──────────────────────────────────────┤
/// │ chunk_capacity │ 0x10000       │ Decompressed bytes per refill        │
/// │ terminator     │ Byte(b'\n')   │ What ends a line                     │
/// │ max_line_len   │ None          │ Upper bound on one assembled line    │
/// │ window_log_max │ None          │ Largest zstd window accepted         │
/// └────────────────┴───────────────┴──────────────────────────────────────┘
/// ```
///
/// `window_log_max` only applies to readers built with
/// [`LineReader::open_with_config`](crate::LineReader::open_with_config);
/// a caller-supplied codec is used as is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Capacity of the fixed chunk buffer. Must be at least 1.
    pub chunk_capacity: usize,

    pub terminator: Terminator,

    /// When set, a line longer than this many bytes (terminator excluded)
    /// fails the reader with [`ReaderError::LineTooLong`] instead of
    /// growing the carry-over buffer without bound.
    pub max_line_len: Option<usize>,

    /// Passed to the zstd decoder as `WindowLogMax`.
    pub window_log_max: Option<u32>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            terminator: Terminator::default(),
            max_line_len: None,
            window_log_max: None,
        }
    }
}

impl ReaderConfig {
    /// Check the settings before any resource is acquired.
    ///
    /// # Errors
    ///
    /// [`ReaderError::InvalidConfig`] for a zero `chunk_capacity` or a zero
    /// `max_line_len`.
    pub fn validate(&self) -> Result<(), ReaderError> {
        if self.chunk_capacity == 0 {
            return Err(ReaderError::InvalidConfig("chunk_capacity must be at least 1"));
        }
        if self.max_line_len == Some(0) {
            return Err(ReaderError::InvalidConfig("max_line_len must be at least 1"));
        }
        Ok(())
    }
}

/// Line terminator policy.
///
/// Detection is a literal byte match; no locale or encoding awareness.
///
/// ```text
///   Byte(b)  → split on b, strip b
///   CrLf     → split on \n, strip \n and one \r right before it
/// ```
///
/// Under `CrLf` a bare `\n` still ends a line, and a `\r` at the very end
/// of the stream (with no `\n` after it) is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminator {
    Byte(u8),
    CrLf,
}

impl Default for Terminator {
    fn default() -> Self {
        Self::Byte(b'\n')
    }
}

impl Terminator {
    /// The byte the scanner searches for.
    #[must_use]
    pub fn scan_byte(self) -> u8 {
        match self {
            Self::Byte(b) => b,
            Self::CrLf => b'\n',
        }
    }

    /// Length of the trailing run to remove from `line`, which is
    /// everything before a found `scan_byte`.
    pub(crate) fn strip_len(self, line: &[u8]) -> usize {
        match self {
            Self::CrLf if line.last() == Some(&b'\r') => 1,
            _ => 0,
        }
    }
}
