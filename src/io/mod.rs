/// I/O sources and host path helpers

/// Host path helpers for ATR files
pub mod reader;
/// Byte-range readers backing an image
pub mod source;

pub use reader::{is_atr_file, split_inner_path};
pub use source::{FileSource, SectorSource};
