use crate::error::CodecError;

/// Outcome of one [`Decompress::decompress_next`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fill {
    /// Number of bytes written to the front of the output buffer.
    pub written: usize,
    /// The logical stream is exhausted. Once reported, every later call
    /// reports it again with `written == 0`.
    pub stream_end: bool,
}

impl Fill {
    /// A fill that marks the end of the stream.
    #[must_use]
    pub fn end(written: usize) -> Self {
        Self {
            written,
            stream_end: true,
        }
    }
}

/// A streaming decompressor that fills caller-owned buffers.
///
/// Implementations own the compressed input and the engine state. The
/// line reader never looks at compressed bytes; it only asks for the
/// next run of decompressed output.
///
/// Contract for [`decompress_next`](Self::decompress_next):
///
/// ```text
///   out.len() bytes written  → more output may follow
///   fewer bytes written      → only when stream_end is set
///   stream_end reported once → later calls: Fill::end(0), no input read
/// ```
pub trait Decompress {
    /// Decompress into `out`, consuming as much input as needed.
    ///
    /// # Errors
    ///
    /// [`CodecError::Decompress`] when the compressed stream is corrupt or
    /// truncated, [`CodecError::Io`] when reading the input fails.
    fn decompress_next(&mut self, out: &mut [u8]) -> Result<Fill, CodecError>;

    /// Total decompressed bytes produced so far.
    fn bytes_produced(&self) -> u64;

    /// Short codec name used in log events.
    fn name(&self) -> &'static str;
}
