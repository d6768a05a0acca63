#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use zline_codec::ZstdDecompressor;
use zline_reader::{LineReader, ReaderConfig};

// Fuzz target: compress arbitrary text, read it back line by line.
//
// Exercises the real zstd adapter with refills that end at arbitrary
// points inside lines.
fuzz_target!(|data: &[u8]| {
    let packed = zstd::encode_all(Cursor::new(data), 1).unwrap();
    let codec = ZstdDecompressor::new(packed.as_slice(), None).unwrap();
    let config = ReaderConfig {
        chunk_capacity: 61,
        ..ReaderConfig::default()
    };
    let reader = LineReader::with_decompressor(codec, config).unwrap();

    let lines: Vec<Vec<u8>> = reader.map(|line| line.unwrap().into_bytes()).collect();
    let expected: Vec<&[u8]> = match data.strip_suffix(b"\n") {
        Some(body) => body.split(|&b| b == b'\n').collect(),
        None if data.is_empty() => Vec::new(),
        None => data.split(|&b| b == b'\n').collect(),
    };
    assert_eq!(lines, expected);
});
