/// Errors raised by a codec adapter.
///
/// ```text
///   CodecError
///   ├── InvalidMagic        ← first four bytes are not a zstd frame magic
///   ├── TruncatedHeader     ← input ended inside the four-byte magic
///   ├── Decompress(io)      ← the engine rejected the compressed stream
///   └── Io(std::io::Error)  ← from reading the compressed input
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The stream does not start with a zstd frame or skippable frame.
    #[error("invalid frame magic: expected 0xFD2FB528, got {found:#010X}")]
    InvalidMagic { found: u32 },

    /// Fewer than four bytes were available, so no frame can follow.
    #[error("input ended after {len} bytes, inside the frame header")]
    TruncatedHeader { len: usize },

    /// The decompression engine failed mid-stream.
    ///
    /// zstd surfaces corrupt blocks, checksum mismatches and truncated
    /// frames as `std::io::Error`; they are kept apart from plain I/O
    /// failures so the reader can report them as decode failures.
    #[error("zstd decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
