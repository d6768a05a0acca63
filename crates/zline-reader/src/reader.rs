use std::fs::File;
use std::io::BufReader;
use std::iter::FusedIterator;
use std::path::Path;

use zline_codec::{Decompress, ZstdDecompressor};

use crate::assembler::LineAssembler;
use crate::chunk::ChunkBuffer;
use crate::config::ReaderConfig;
use crate::error::ReaderError;
use crate::line::Line;

/// A [`LineReader`] over a zstd file on disk.
pub type FileReader = LineReader<ZstdDecompressor<BufReader<File>>>;

/// Pull-based line reader over a decompressed stream.
///
/// The reader owns the codec (and through it the file descriptor), one
/// fixed chunk buffer and one growable carry-over buffer. Nothing is
/// shared between readers. Each [`next_line`](Self::next_line) call may
/// block on file I/O when the chunk needs a refill.
///
/// ```text
///   codec ──decompress_next──▶ chunk ──scan──▶ assembler ──move──▶ Line
/// ```
///
/// State machine:
///
/// ```text
///   Reading ──stream end, carry empty──▶ Exhausted   (next_line → Ok(None))
///      │
///      ├──decode error / line limit──▶ Failed        (next_line → Err(Failed))
///      │
///      └──close()──▶ Closed                          (next_line → Err(Closed))
/// ```
///
/// `Exhausted` and `Failed` can also be closed.
///
/// # Example
///
/// ```rust,no_run
/// use zline_reader::LineReader;
///
/// let mut reader = LineReader::open("events.log.zst")?;
/// while let Some(line) = reader.next_line()? {
///     println!("{}", line.to_string_lossy());
/// }
/// reader.close()?;
/// # Ok::<(), zline_reader::ReaderError>(())
/// ```
pub struct LineReader<D: Decompress> {
    /// `None` once closed.
    codec: Option<D>,
    chunk: ChunkBuffer,
    assembler: LineAssembler,
    stream_end: bool,
    state: ReaderState,
    lines_read: u64,
    bytes_decompressed: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReaderState {
    Reading,
    Exhausted,
    Failed,
    Closed,
}

impl FileReader {
    /// Open a zstd file with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`open_with_config`](Self::open_with_config).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    /// Open a zstd file.
    ///
    /// The frame header is read and checked before returning, so a file
    /// that is not zstd fails here rather than on the first read. On any
    /// error the file descriptor is closed before returning.
    ///
    /// # Errors
    ///
    /// - [`ReaderError::InvalidConfig`] if `config` is rejected.
    /// - [`ReaderError::Open`] if the file cannot be opened.
    /// - [`ReaderError::CodecInit`] if the header is not a zstd frame or
    ///   the decoder cannot be set up.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: ReaderConfig,
    ) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        config.validate()?;

        let file = File::open(path).map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let codec = ZstdDecompressor::new(BufReader::new(file), config.window_log_max)
            .map_err(|source| ReaderError::CodecInit {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(
            path = %path.display(),
            chunk_capacity = config.chunk_capacity,
            "opened zstd line reader"
        );
        Ok(Self::build(codec, &config))
    }
}

impl<D: Decompress> LineReader<D> {
    /// Build a reader over any codec adapter.
    ///
    /// # Errors
    ///
    /// [`ReaderError::InvalidConfig`] if `config` is rejected.
    pub fn with_decompressor(codec: D, config: ReaderConfig) -> Result<Self, ReaderError> {
        config.validate()?;
        Ok(Self::build(codec, &config))
    }

    fn build(codec: D, config: &ReaderConfig) -> Self {
        Self {
            codec: Some(codec),
            chunk: ChunkBuffer::with_capacity(config.chunk_capacity),
            assembler: LineAssembler::new(config.terminator, config.max_line_len),
            stream_end: false,
            state: ReaderState::Reading,
            lines_read: 0,
            bytes_decompressed: 0,
        }
    }

    /// Return the next line, or `Ok(None)` once the stream is exhausted.
    ///
    /// A final line without a terminator is still returned, once. A
    /// trailing terminator does not produce an extra empty line.
    ///
    /// # Errors
    ///
    /// - [`ReaderError::Decode`] on the call that first hits corrupt or
    ///   truncated input. Lines completed before the failure have already
    ///   been returned; the partial line in progress is dropped.
    /// - [`ReaderError::LineTooLong`] if a line exceeds `max_line_len`.
    /// - [`ReaderError::Failed`] on every call after either of the above.
    /// - [`ReaderError::Closed`] after [`close`](Self::close).
    pub fn next_line(&mut self) -> Result<Option<Line>, ReaderError> {
        match self.state {
            ReaderState::Reading => {}
            ReaderState::Exhausted => return Ok(None),
            ReaderState::Failed => return Err(ReaderError::Failed),
            ReaderState::Closed => return Err(ReaderError::Closed),
        }
        let Some(codec) = self.codec.as_mut() else {
            return Err(ReaderError::Closed);
        };

        loop {
            let taken = match self.assembler.take_line(&mut self.chunk) {
                Ok(None) if self.stream_end => self.assembler.finish(),
                taken => taken,
            };
            match taken {
                Ok(Some(bytes)) => {
                    self.lines_read += 1;
                    return Ok(Some(Line::new(bytes)));
                }
                Ok(None) if self.stream_end => {
                    self.state = ReaderState::Exhausted;
                    return Ok(None);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(lines_read = self.lines_read, "line limit exceeded: {e}");
                    self.fail();
                    return Err(e);
                }
            }

            match self.chunk.refill(codec) {
                Ok(fill) => {
                    tracing::trace!(
                        codec = codec.name(),
                        written = fill.written,
                        stream_end = fill.stream_end,
                        "refilled chunk"
                    );
                    self.bytes_decompressed = codec.bytes_produced();
                    self.stream_end = fill.stream_end;
                }
                Err(source) => {
                    let offset = codec.bytes_produced();
                    tracing::warn!(
                        offset,
                        carried = self.assembler.carried(),
                        "decode failure, reader latched: {source}"
                    );
                    self.fail();
                    return Err(ReaderError::Decode { offset, source });
                }
            }
        }
    }

    /// Release the codec, the file descriptor and both buffers.
    ///
    /// Works from any state except `Closed`. Dropping the reader has the
    /// same effect without the double-close check.
    ///
    /// # Errors
    ///
    /// [`ReaderError::Closed`] if the reader was already closed; nothing is
    /// released twice.
    pub fn close(&mut self) -> Result<(), ReaderError> {
        if self.state == ReaderState::Closed {
            return Err(ReaderError::Closed);
        }
        if let Some(codec) = self.codec.take() {
            self.bytes_decompressed = codec.bytes_produced();
        }
        self.chunk.release();
        self.assembler.discard();
        self.state = ReaderState::Closed;

        tracing::debug!(
            lines_read = self.lines_read,
            bytes_decompressed = self.bytes_decompressed,
            "closed line reader"
        );
        Ok(())
    }

    /// Lines returned so far, the final unterminated one included.
    #[must_use]
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Decompressed bytes pulled from the codec so far.
    #[must_use]
    pub fn bytes_decompressed(&self) -> u64 {
        self.bytes_decompressed
    }

    #[must_use]
    pub fn chunk_capacity(&self) -> usize {
        self.chunk.capacity()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == ReaderState::Closed
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state == ReaderState::Failed
    }

    fn fail(&mut self) {
        self.state = ReaderState::Failed;
        self.assembler.discard();
        self.chunk.clear();
    }
}

/// Yields each line, then ends. An error is yielded once and ends the
/// iteration; the reader itself keeps reporting [`ReaderError::Failed`].
impl<D: Decompress> Iterator for LineReader<D> {
    type Item = Result<Line, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            ReaderState::Failed | ReaderState::Closed => None,
            ReaderState::Reading | ReaderState::Exhausted => self.next_line().transpose(),
        }
    }
}

impl<D: Decompress> FusedIterator for LineReader<D> {}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use tracing_test::traced_test;
    use zline_codec::{CodecError, Fill, Passthrough};

    use super::*;
    use crate::config::Terminator;

    fn reader(
        data: &'static [u8],
        chunk_capacity: usize,
    ) -> LineReader<Passthrough<&'static [u8]>> {
        let config = ReaderConfig {
            chunk_capacity,
            ..ReaderConfig::default()
        };
        LineReader::with_decompressor(Passthrough::new(data), config).unwrap()
    }

    fn collect(reader: &mut LineReader<impl Decompress>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().unwrap() {
            lines.push(line.to_string_lossy().into_owned());
        }
        lines
    }

    /// Serves the given chunks, then fails like a corrupt frame would.
    struct Corrupt {
        chunks: VecDeque<&'static [u8]>,
        produced: u64,
        calls: usize,
    }

    impl Corrupt {
        fn new(chunks: &[&'static [u8]]) -> Self {
            Self {
                chunks: chunks.iter().copied().collect(),
                produced: 0,
                calls: 0,
            }
        }
    }

    impl Decompress for Corrupt {
        fn decompress_next(&mut self, out: &mut [u8]) -> Result<Fill, CodecError> {
            self.calls += 1;
            match self.chunks.pop_front() {
                Some(chunk) => {
                    out[..chunk.len()].copy_from_slice(chunk);
                    self.produced += chunk.len() as u64;
                    Ok(Fill {
                        written: chunk.len(),
                        stream_end: false,
                    })
                }
                None => Err(CodecError::Decompress(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "corrupt block",
                ))),
            }
        }

        fn bytes_produced(&self) -> u64 {
            self.produced
        }

        fn name(&self) -> &'static str {
            "corrupt"
        }
    }

    #[test]
    fn yields_lines_then_end() {
        let mut reader = reader(b"a\nbb\n\nccc", 64);
        assert_eq!(collect(&mut reader), ["a", "bb", "", "ccc"]);
        assert!(reader.next_line().unwrap().is_none());
        assert!(reader.next_line().unwrap().is_none());
        assert_eq!(reader.lines_read(), 4);
        assert_eq!(reader.bytes_decompressed(), 9);
    }

    #[test]
    fn trailing_terminator_adds_no_empty_line() {
        let mut reader = reader(b"a\nb\n", 3);
        assert_eq!(collect(&mut reader), ["a", "b"]);
    }

    #[test]
    fn lone_terminator_is_one_empty_line() {
        let mut reader = reader(b"\n", 3);
        assert_eq!(collect(&mut reader), [""]);
    }

    #[test]
    fn empty_stream_has_no_lines() {
        let mut reader = reader(b"", 8);
        assert!(reader.next_line().unwrap().is_none());
        assert_eq!(reader.lines_read(), 0);
    }

    #[test]
    fn line_longer_than_chunk() {
        let mut reader = reader(b"0123456789abcdef\nxy", 4);
        assert_eq!(collect(&mut reader), ["0123456789abcdef", "xy"]);
    }

    #[test]
    fn crlf_configuration() {
        let config = ReaderConfig {
            chunk_capacity: 2,
            terminator: Terminator::CrLf,
            ..ReaderConfig::default()
        };
        let codec = Passthrough::new(&b"a\r\nb\nc\r"[..]);
        let mut reader = LineReader::with_decompressor(codec, config).unwrap();
        assert_eq!(collect(&mut reader), ["a", "b", "c\r"]);
    }

    #[test]
    fn decode_failure_reported_once_then_latched() {
        let codec = Corrupt::new(&[&b"good\npar"[..], &b"tial"[..]]);
        let mut reader = LineReader::with_decompressor(codec, ReaderConfig::default()).unwrap();

        assert_eq!(reader.next_line().unwrap().unwrap(), "good");
        let err = reader.next_line().unwrap_err();
        assert!(matches!(err, ReaderError::Decode { offset: 12, .. }));
        assert!(reader.is_failed());

        for _ in 0..3 {
            assert!(matches!(reader.next_line(), Err(ReaderError::Failed)));
        }
        assert_eq!(reader.codec.as_ref().unwrap().calls, 3);
    }

    #[test]
    #[traced_test]
    fn decode_failure_is_logged() {
        let mut reader =
            LineReader::with_decompressor(Corrupt::new(&[]), ReaderConfig::default()).unwrap();
        assert!(reader.next_line().is_err());
        assert!(logs_contain("decode failure, reader latched"));
    }

    #[test]
    fn crlf_limit_independent_of_chunk_capacity() {
        for chunk_capacity in [1, 2, 3, 4, 5, 16] {
            let config = ReaderConfig {
                chunk_capacity,
                terminator: Terminator::CrLf,
                max_line_len: Some(3),
                ..ReaderConfig::default()
            };
            let codec = Passthrough::new(&b"abc\r\n"[..]);
            let mut reader = LineReader::with_decompressor(codec, config).unwrap();
            assert_eq!(collect(&mut reader), ["abc"], "chunk_capacity {chunk_capacity}");
        }
    }

    #[test]
    fn unterminated_tail_over_limit_latches() {
        let config = ReaderConfig {
            max_line_len: Some(3),
            ..ReaderConfig::default()
        };
        let codec = Passthrough::new(&b"ok\ntoolong"[..]);
        let mut reader = LineReader::with_decompressor(codec, config).unwrap();

        assert_eq!(reader.next_line().unwrap().unwrap(), "ok");
        assert!(matches!(
            reader.next_line(),
            Err(ReaderError::LineTooLong { limit: 3, .. })
        ));
        assert!(matches!(reader.next_line(), Err(ReaderError::Failed)));
    }

    #[test]
    fn line_limit_latches() {
        let config = ReaderConfig {
            chunk_capacity: 4,
            max_line_len: Some(6),
            ..ReaderConfig::default()
        };
        let codec = Passthrough::new(&b"ok\nmuch too long\n"[..]);
        let mut reader = LineReader::with_decompressor(codec, config).unwrap();

        assert_eq!(reader.next_line().unwrap().unwrap(), "ok");
        assert!(matches!(reader.next_line(), Err(ReaderError::LineTooLong { limit: 6, .. })));
        assert!(matches!(reader.next_line(), Err(ReaderError::Failed)));
    }

    #[test]
    fn close_twice_is_reported() {
        let mut reader = reader(b"a\nb\n", 8);
        assert_eq!(reader.next_line().unwrap().unwrap(), "a");

        reader.close().unwrap();
        assert!(reader.is_closed());
        assert_eq!(reader.chunk_capacity(), 0);
        assert!(matches!(reader.close(), Err(ReaderError::Closed)));
        assert!(matches!(reader.next_line(), Err(ReaderError::Closed)));
    }

    #[test]
    fn close_after_failure() {
        let mut reader =
            LineReader::with_decompressor(Corrupt::new(&[]), ReaderConfig::default()).unwrap();
        assert!(reader.next_line().is_err());
        reader.close().unwrap();
        assert!(matches!(reader.next_line(), Err(ReaderError::Closed)));
    }

    #[test]
    fn iterator_stops_after_first_error() {
        let codec = Corrupt::new(&[&b"x\ny\nz"[..]]);
        let reader = LineReader::with_decompressor(codec, ReaderConfig::default()).unwrap();
        let results: Vec<_> = reader.collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), &"x");
        assert_eq!(results[1].as_ref().unwrap(), &"y");
        assert!(matches!(results[2], Err(ReaderError::Decode { .. })));
    }

    #[test]
    fn lines_outlive_the_reader() {
        let mut reader = reader(b"kept\n", 8);
        let line = reader.next_line().unwrap().unwrap();
        reader.close().unwrap();
        drop(reader);
        assert_eq!(line.into_bytes(), b"kept");
    }

    #[test]
    fn zero_capacity_rejected() {
        let config = ReaderConfig {
            chunk_capacity: 0,
            ..ReaderConfig::default()
        };
        let result = LineReader::with_decompressor(Passthrough::new(&b""[..]), config);
        assert!(matches!(result, Err(ReaderError::InvalidConfig(_))));
    }
}
