use std::io::{self, Read};

use crate::decompress::{Decompress, Fill};
use crate::error::CodecError;

/// Identity adapter for input that is already decompressed.
///
/// Lets the line reader run over plain text, which keeps assembler tests
/// and benchmarks independent of the zstd engine.
pub struct Passthrough<R> {
    inner: R,
    produced: u64,
    finished: bool,
}

impl<R: Read> Passthrough<R> {
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            produced: 0,
            finished: false,
        }
    }
}

impl<R: Read> Decompress for Passthrough<R> {
    fn decompress_next(&mut self, out: &mut [u8]) -> Result<Fill, CodecError> {
        if self.finished {
            return Ok(Fill::end(0));
        }

        let mut written = 0;
        while written < out.len() {
            match self.inner.read(&mut out[written..]) {
                Ok(0) => {
                    self.finished = true;
                    break;
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(CodecError::Io(e)),
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
        "none"
    }
}
