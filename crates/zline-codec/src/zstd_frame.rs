use std::io::{self, BufRead, Chain, Cursor, Read};

use zstd::stream::read::Decoder;

use crate::decompress::{Decompress, Fill};
use crate::error::CodecError;

/// Magic number at the start of every zstd frame (little-endian).
pub const ZSTD_MAGIC: u32 = 0xFD2F_B528;

/// Skippable frames use any magic in this range. They carry no output
/// but are valid at the start of a stream.
pub const SKIPPABLE_MAGIC: std::ops::RangeInclusive<u32> = 0x184D_2A50..=0x184D_2A5F;

const MAGIC_LEN: usize = 4;

type Framed<R> = Chain<Cursor<[u8; MAGIC_LEN]>, R>;

/// Read and validate the four-byte frame magic at the head of `reader`.
///
/// Returns `Ok(None)` for a zero-byte input, which is treated as an empty
/// stream rather than an invalid one.
///
/// # Errors
///
/// - [`CodecError::TruncatedHeader`] if the input ends inside the magic.
/// - [`CodecError::InvalidMagic`] if the bytes are not a zstd or skippable
///   frame magic.
/// - [`CodecError::Io`] if reading fails.
pub fn sniff_header<R: Read>(reader: &mut R) -> Result<Option<[u8; MAGIC_LEN]>, CodecError> {
    let mut magic = [0u8; MAGIC_LEN];
    let mut filled = 0;

    while filled < MAGIC_LEN {
        match reader.read(&mut magic[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(CodecError::Io(e)),
        }
    }

    match filled {
        0 => Ok(None),
        MAGIC_LEN => {
            let found = u32::from_le_bytes(magic);
            if found == ZSTD_MAGIC || SKIPPABLE_MAGIC.contains(&found) {
                Ok(Some(magic))
            } else {
                Err(CodecError::InvalidMagic { found })
            }
        }
        len => Err(CodecError::TruncatedHeader { len }),
    }
}

/// zstd adapter over any buffered reader of compressed bytes.
///
/// The frame magic is checked eagerly in [`new`](Self::new), so a file
/// that is not zstd at all fails at open time. Corruption past the header
/// only shows up once decompression reaches it, as
/// [`CodecError::Decompress`].
///
/// Concatenated frames are decoded back to back, as the `zstd` CLI does.
pub struct ZstdDecompressor<R: BufRead> {
    /// `None` for a zero-byte input.
    decoder: Option<Decoder<'static, Framed<R>>>,
    produced: u64,
    finished: bool,
}

impl<R: BufRead> ZstdDecompressor<R> {
    /// Validate the frame header and set up the decoder.
    ///
    /// `window_log_max` raises or lowers the largest window the decoder
    /// accepts; `None` keeps the zstd default.
    ///
    /// # Errors
    ///
    /// Any error from [`sniff_header`], or [`CodecError::Io`] if the
    /// decoder context cannot be created or rejects `window_log_max`.
    pub fn new(mut reader: R, window_log_max: Option<u32>) -> Result<Self, CodecError> {
        let Some(magic) = sniff_header(&mut reader)? else {
            return Ok(Self {
                decoder: None,
                produced: 0,
                finished: false,
            });
        };

        let mut decoder = Decoder::with_buffer(Cursor::new(magic).chain(reader))?;
        if let Some(log) = window_log_max {
            decoder.window_log_max(log)?;
        }

        Ok(Self {
            decoder: Some(decoder),
            produced: 0,
            finished: false,
        })
    }
}

impl<R: BufRead> Decompress for ZstdDecompressor<R> {
    fn decompress_next(&mut self, out: &mut [u8]) -> Result<Fill, CodecError> {
        if self.finished {
            return Ok(Fill::end(0));
        }
        let Some(decoder) = self.decoder.as_mut() else {
            self.finished = true;
            return Ok(Fill::end(0));
        };

        let mut written = 0;
        while written < out.len() {
            match decoder.read(&mut out[written..]) {
                Ok(0) => {
                    self.finished = true;
                    break;
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::trace!(produced = self.produced, "zstd engine error: {e}");
                    return Err(CodecError::Decompress(e));
                }
            }
        }

        self.produced += written as u64;
        Ok(Fill {
            written,
            stream_end: self.finished,
        })
    }

    fn bytes_produced(&self) -> u64 {
        self.produced
    }

    fn name(&self) -> &'static str {
        "zstd"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compressed(data: &[u8]) -> Vec<u8> {
        zstd::encode_all(Cursor::new(data), 3).unwrap()
    }

    fn drain(codec: &mut impl Decompress, chunk: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; chunk];
        loop {
            let fill = codec.decompress_next(&mut buf).unwrap();
            out.extend_from_slice(&buf[..fill.written]);
            if fill.stream_end {
                return out;
            }
            assert_eq!(fill.written, chunk, "short fill without stream end");
        }
    }

    #[test]
    fn sniff_accepts_zstd_magic() {
        let data = compressed(b"hello");
        let magic = sniff_header(&mut data.as_slice()).unwrap();
        assert_eq!(magic, Some([0x28, 0xB5, 0x2F, 0xFD]));
    }

    #[test]
    fn sniff_accepts_skippable_magic() {
        let data = [0x50, 0x2A, 0x4D, 0x18, 0, 0, 0, 0];
        assert!(sniff_header(&mut &data[..]).unwrap().is_some());
    }

    #[test]
    fn sniff_empty_input_is_empty_stream() {
        assert!(sniff_header(&mut &b""[..]).unwrap().is_none());
    }

    #[test]
    fn sniff_rejects_plain_text() {
        let result = sniff_header(&mut &b"plain text"[..]);
        assert!(matches!(
            result,
            Err(CodecError::InvalidMagic { found: 0x6961_6C70 })
        ));
    }

    #[test]
    fn sniff_rejects_short_input() {
        let result = sniff_header(&mut &[0x28u8, 0xB5][..]);
        assert!(matches!(result, Err(CodecError::TruncatedHeader { len: 2 })));
    }

    #[test]
    fn decompresses_across_small_fills() {
        let data = "line of text\n".repeat(500);
        let packed = compressed(data.as_bytes());
        let mut codec = ZstdDecompressor::new(packed.as_slice(), None).unwrap();

        assert_eq!(drain(&mut codec, 7), data.as_bytes());
        assert_eq!(codec.bytes_produced(), data.len() as u64);
    }

    #[test]
    fn decodes_concatenated_frames() {
        let mut packed = compressed(b"first\n");
        packed.extend(compressed(b"second\n"));
        let mut codec = ZstdDecompressor::new(packed.as_slice(), None).unwrap();

        assert_eq!(drain(&mut codec, 64), b"first\nsecond\n");
    }

    #[test]
    fn end_is_sticky() {
        let packed = compressed(b"abc");
        let mut codec = ZstdDecompressor::new(packed.as_slice(), None).unwrap();
        let mut buf = [0u8; 16];

        assert_eq!(codec.decompress_next(&mut buf).unwrap(), Fill::end(3));
        assert_eq!(codec.decompress_next(&mut buf).unwrap(), Fill::end(0));
        assert_eq!(codec.decompress_next(&mut buf).unwrap(), Fill::end(0));
    }

    #[test]
    fn zero_byte_input_is_empty_stream() {
        let mut codec = ZstdDecompressor::new(&b""[..], None).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(codec.decompress_next(&mut buf).unwrap(), Fill::end(0));
    }

    #[test]
    fn truncated_frame_is_decompress_error() {
        let data: String = (0..5_000).map(|i| format!("{i:08x}:{}\n", i * 7919)).collect();
        let packed = compressed(data.as_bytes());
        let truncated = &packed[..packed.len() / 2];
        let mut codec = ZstdDecompressor::new(truncated, None).unwrap();
        let mut buf = vec![0u8; 1024];

        let err = loop {
            match codec.decompress_next(&mut buf) {
                Ok(fill) => assert!(!fill.stream_end, "truncated frame reported a clean end"),
                Err(e) => break e,
            }
        };
        assert!(matches!(err, CodecError::Decompress(_)));
    }

    #[test]
    fn rejects_non_zstd_input() {
        let result = ZstdDecompressor::new(&b"not compressed at all"[..], None);
        assert!(matches!(result, Err(CodecError::InvalidMagic { .. })));
    }
}
