#![no_main]

use libfuzzer_sys::fuzz_target;
use zline_codec::ZstdDecompressor;
use zline_reader::{LineReader, ReaderConfig, ReaderError};

// Fuzz target: line reader over arbitrary "compressed" bytes.
//
// Most inputs are rejected at the header or fail mid-stream. Catches:
// - Panics in the chunk/carry-over bookkeeping on short or odd fills
// - A failure that is not latched (a second error other than Failed)
// - Lines emitted after a reported failure
fuzz_target!(|data: &[u8]| {
    let Ok(codec) = ZstdDecompressor::new(data, Some(20)) else {
        return;
    };
    let config = ReaderConfig {
        chunk_capacity: 257,
        max_line_len: Some(1 << 20),
        ..ReaderConfig::default()
    };
    let mut reader = LineReader::with_decompressor(codec, config).unwrap();

    loop {
        match reader.next_line() {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(_) => {
                assert!(matches!(reader.next_line(), Err(ReaderError::Failed)));
                break;
            }
        }
    }
});
