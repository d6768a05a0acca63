use std::path::PathBuf;

use zline_codec::CodecError;

/// Errors returned by [`LineReader`](crate::LineReader) and [`Line`](crate::Line).
///
/// ```text
///   ReaderError
///   ├── Open            ← the path could not be opened
///   ├── CodecInit       ← the codec rejected the file header
///   ├── Decode          ← corrupt or truncated stream, reported once
///   ├── LineTooLong     ← a line outgrew ReaderConfig::max_line_len
///   ├── Failed          ← any call after Decode or LineTooLong
///   ├── Closed          ← next_line or close on a closed reader
///   ├── DoubleRelease   ← Line::release called twice
///   └── InvalidConfig   ← ReaderConfig rejected at construction
/// ```
///
/// `Decode` and `LineTooLong` are terminal: the reader latches and every
/// later call returns `Failed`. Reopen the file to start over.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file opened, but the codec could not start on its first bytes.
    #[error("cannot decode {}: {source}", .path.display())]
    CodecInit {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The compressed stream failed after `offset` bytes of good output.
    ///
    /// Any partial line carried over from before the failure is dropped.
    #[error("decoding failed after {offset} decompressed bytes: {source}")]
    Decode {
        offset: u64,
        #[source]
        source: CodecError,
    },

    #[error("line of at least {len} bytes exceeds limit {limit}")]
    LineTooLong { len: usize, limit: usize },

    #[error("reader failed earlier; reopen the file to retry")]
    Failed,

    #[error("reader is closed")]
    Closed,

    #[error("line was already released")]
    DoubleRelease,

    #[error("invalid reader configuration: {0}")]
    InvalidConfig(&'static str),
}
