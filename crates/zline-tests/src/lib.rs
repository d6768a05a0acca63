//! Fixture helpers shared by the integration tests and benchmarks.
//!
//! Every fixture lives in its own [`tempfile::TempDir`], removed when the
//! [`Fixture`] is dropped.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zline_reader::{FileReader, ReaderConfig, ReaderError};

pub struct Fixture {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

impl Fixture {
    /// Compress `data` as one zstd frame at level 3.
    pub fn zstd(data: &[u8]) -> Self {
        Self::raw(&compress(data))
    }

    /// Compress `data` with a content checksum, so corruption anywhere in
    /// the frame is detected at the latest when the frame ends.
    pub fn zstd_checked(data: &[u8]) -> Self {
        Self::raw(&compress_checked(data))
    }

    /// Compress each part as its own frame and concatenate the frames.
    pub fn zstd_frames(parts: &[&[u8]]) -> Self {
        let bytes: Vec<u8> = parts.iter().flat_map(|part| compress(part)).collect();
        Self::raw(&bytes)
    }

    /// Write `bytes` verbatim.
    pub fn raw(bytes: &[u8]) -> Self {
        let dir = tempfile::tempdir().expect("create fixture dir");
        let path = dir.path().join("fixture.zst");
        std::fs::write(&path, bytes).expect("write fixture");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> FileReader {
        FileReader::open(&self.path).expect("open fixture")
    }

    pub fn open_with(&self, config: ReaderConfig) -> FileReader {
        FileReader::open_with_config(&self.path, config).expect("open fixture")
    }
}

pub fn compress(data: &[u8]) -> Vec<u8> {
    zstd::encode_all(Cursor::new(data), 3).expect("zstd compress")
}

pub fn compress_checked(data: &[u8]) -> Vec<u8> {
    let mut encoder = zstd::stream::write::Encoder::new(Vec::new(), 3).expect("zstd encoder");
    encoder.include_checksum(true).expect("enable checksum");
    encoder.write_all(data).expect("zstd compress");
    encoder.finish().expect("zstd finish")
}

/// Read every line as raw bytes, failing on the first error.
pub fn read_all(reader: &mut FileReader) -> Result<Vec<Vec<u8>>, ReaderError> {
    let mut lines = Vec::new();
    while let Some(line) = reader.next_line()? {
        lines.push(line.into_bytes());
    }
    Ok(lines)
}

/// Numbered, lossy rendering used by snapshot tests.
pub fn render(lines: &[Vec<u8>]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{i}: {:?}", String::from_utf8_lossy(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Deterministic text that zstd cannot shrink much, so a truncated or
/// damaged frame still holds many complete lines before the damage.
pub fn noisy_lines(count: usize) -> Vec<u8> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut out = Vec::new();
    for i in 0..count {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        writeln!(out, "{i:06} {state:016x} {:x}", state.rotate_left(29)).expect("write to Vec");
    }
    out
}
