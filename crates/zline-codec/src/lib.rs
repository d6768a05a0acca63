#![warn(clippy::pedantic)]

pub mod decompress;
pub mod error;
pub mod passthrough;
pub mod zstd_frame;

pub use decompress::{Decompress, Fill};
pub use error::CodecError;
pub use passthrough::Passthrough;
pub use zstd_frame::{ZstdDecompressor, sniff_header};
