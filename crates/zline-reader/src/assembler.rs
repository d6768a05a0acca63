use std::mem;

use crate::chunk::ChunkBuffer;
use crate::config::Terminator;
use crate::error::ReaderError;

/// Splits chunk contents into lines, carrying partial lines across refills.
///
/// Each byte is copied once on its way to the caller:
///
/// ```text
///   line inside one chunk:  chunk ──copy──▶ line
///   line across chunks:     chunk ──copy──▶ carry ──move──▶ line
/// ```
///
/// The carry-over is a plain `Vec`, so a line spanning many chunks grows
/// it with amortized doubling. Every line is handed out with at least one
/// byte of spare capacity, so a NUL can be appended without reallocating.
pub(crate) struct LineAssembler {
    terminator: Terminator,
    carry: Vec<u8>,
    max_line_len: Option<usize>,
}

impl LineAssembler {
    pub(crate) fn new(terminator: Terminator, max_line_len: Option<usize>) -> Self {
        Self {
            terminator,
            carry: Vec::new(),
            max_line_len,
        }
    }

    /// Scan the unscanned part of `chunk` for the next terminator.
    ///
    /// Returns the completed line, or `None` once the chunk is drained and
    /// its tail has moved into the carry-over.
    pub(crate) fn take_line(
        &mut self,
        chunk: &mut ChunkBuffer,
    ) -> Result<Option<Vec<u8>>, ReaderError> {
        let window = chunk.unscanned();

        let Some(pos) = memchr::memchr(self.terminator.scan_byte(), window) else {
            let len = window.len();
            if len == 0 {
                return Ok(None);
            }
            // A trailing '\r' may still turn out to be half of a CRLF.
            let pending = self.carry.len() + len - self.terminator.strip_len(window);
            self.check_len(pending)?;
            self.carry.reserve(len + 1);
            self.carry.extend_from_slice(window);
            chunk.consume(len);
            return Ok(None);
        };

        let segment = &window[..pos];
        let line = if self.carry.is_empty() {
            let keep = segment.len() - self.terminator.strip_len(segment);
            self.check_len(keep)?;
            let mut line = Vec::with_capacity(keep + 1);
            line.extend_from_slice(&segment[..keep]);
            line
        } else {
            let tail = if segment.is_empty() { &self.carry[..] } else { segment };
            let keep = self.carry.len() + segment.len() - self.terminator.strip_len(tail);
            self.check_len(keep)?;
            self.carry.reserve(segment.len() + 1);
            self.carry.extend_from_slice(segment);
            self.carry.truncate(keep);
            mem::take(&mut self.carry)
        };

        chunk.consume(pos + 1);
        Ok(Some(line))
    }

    /// Hand out whatever is left once the stream has ended.
    ///
    /// The tail has no terminator, so a trailing `'\r'` is kept and counts
    /// toward the line limit.
    pub(crate) fn finish(&mut self) -> Result<Option<Vec<u8>>, ReaderError> {
        if self.carry.is_empty() {
            return Ok(None);
        }
        self.check_len(self.carry.len())?;
        Ok(Some(mem::take(&mut self.carry)))
    }

    /// Drop the carry-over and its allocation.
    pub(crate) fn discard(&mut self) {
        self.carry = Vec::new();
    }

    pub(crate) fn carried(&self) -> usize {
        self.carry.len()
    }

    fn check_len(&self, len: usize) -> Result<(), ReaderError> {
        match self.max_line_len {
            Some(limit) if len > limit => Err(ReaderError::LineTooLong { len, limit }),
            _ => Ok(()),
        }
    }
}
