#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zline_codec::Passthrough;
use zline_reader::{LineReader, ReaderConfig};

#[derive(Arbitrary, Debug)]
struct Input {
    chunk_capacity: u8,
    data: Vec<u8>,
}

// Fuzz target: splitting must be lossless for every chunk size.
//
// Joining the lines with '\n' (plus one trailing '\n' when the input had
// it) must reproduce the input byte for byte.
fuzz_target!(|input: Input| {
    let config = ReaderConfig {
        chunk_capacity: usize::from(input.chunk_capacity).max(1),
        ..ReaderConfig::default()
    };
    let codec = Passthrough::new(input.data.as_slice());
    let reader = LineReader::with_decompressor(codec, config).unwrap();

    let lines: Vec<Vec<u8>> = reader.map(|line| line.unwrap().into_bytes()).collect();
    let mut joined = lines.join(&b'\n');
    if input.data.last() == Some(&b'\n') {
        joined.push(b'\n');
    }
    assert_eq!(joined, input.data);
});
