#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod line;
pub mod reader;

mod assembler;
mod chunk;

pub use config::{DEFAULT_CHUNK_CAPACITY, ReaderConfig, Terminator};
pub use error::ReaderError;
pub use line::Line;
pub use reader::{FileReader, LineReader};
pub use zline_codec::{CodecError, Decompress, Fill, Passthrough, ZstdDecompressor};
