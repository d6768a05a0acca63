use zline_codec::{CodecError, Decompress, Fill};

/// Fixed-capacity buffer that receives decompressed output.
///
/// ```text
///   0                   cursor            end        capacity
///   ├─────────────────────┼─────────────────┼────────────┤
///   │       scanned       │   unscanned     │   unused
/// ```
///
/// Invariant: `cursor <= end <= capacity`. A refill always writes from
/// offset 0, so the window never starts anywhere else.
pub(crate) struct ChunkBuffer {
    buf: Box<[u8]>,
    cursor: usize,
    end: usize,
}

impl ChunkBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
            end: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes in `[cursor, end)`.
    pub(crate) fn unscanned(&self) -> &[u8] {
        &self.buf[self.cursor..self.end]
    }

    /// Bytes in `[0, end)`, scanned or not.
    #[cfg(test)]
    pub(crate) fn valid(&self) -> &[u8] {
        &self.buf[..self.end]
    }

    pub(crate) fn is_drained(&self) -> bool {
        self.cursor == self.end
    }

    /// Move the cursor past `n` unscanned bytes.
    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.end - self.cursor, "consume past end of chunk");
        self.cursor += n;
        self.debug_check();
    }

    /// Replace the contents with the codec's next run of output.
    ///
    /// Only called once the current contents are drained, so nothing
    /// unscanned is overwritten.
    pub(crate) fn refill<D: Decompress>(&mut self, codec: &mut D) -> Result<Fill, CodecError> {
        debug_assert!(self.is_drained(), "refill with unscanned bytes");
        self.clear();

        let fill = codec.decompress_next(&mut self.buf)?;
        debug_assert!(fill.written <= self.buf.len());
        self.end = fill.written.min(self.buf.len());
        self.debug_check();
        Ok(fill)
    }

    pub(crate) fn clear(&mut self) {
        self.cursor = 0;
        self.end = 0;
    }

    fn debug_check(&self) {
        debug_assert!(
            self.cursor <= self.end && self.end <= self.buf.len(),
            "chunk window out of order: {}..{} of {}",
            self.cursor,
            self.end,
            self.buf.len()
        );
    }

    /// Drop the backing allocation. The buffer is unusable afterwards.
    pub(crate) fn release(&mut self) {
        self.clear();
        self.buf = Box::default();
    }
}
