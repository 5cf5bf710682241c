/*!
# atrmanager

A Rust library for reading Atari 8-bit ATR disk image files with DOS filesystem support.

## Features

- Single (128-byte) and double (256-byte) density ATR images
- Logical sector addressing, including the 128-byte boot sector layout
- DOS 1, DOS 2 and MyDOS directories with subdirectories
- Streaming file reads over sector chains, with `std::io::Read` and `Seek`
- Idiomatic Rust API with comprehensive error handling

## Quick Start

```rust,no_run
use atrmanager::AtrImage;
use std::io::Read;

// Open an existing ATR file
let image = AtrImage::open("disk.atr")?;

// List every file, descending into subdirectories
let mut lister = image.files();
while let Some(path) = lister.next_file() {
    println!("{}", path);
}

// Walk the root directory
let mut root = image.root();
while root.next_entry().is_some() {
    let suffix = if root.is_entry_directory() { "/" } else { "" };
    println!("{}{}", root.filename(), suffix);
}

// Stream a file
let mut stream = image.open_stream("MUSIC/INTRO.SAP")?;
let length = stream.length()?;
let mut data = Vec::with_capacity(length);
stream.read_to_end(&mut data)?;
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Modules

- `format`: ATR header decoding and constants
- `image`: The image container and sector addressing
- `filesystem`: Directory iterator, recursive lister and file stream
- `io`: Sector sources and host path helpers
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Error types and Result alias
pub mod error;
/// Filesystem access (directories, listing, file streams)
pub mod filesystem;
/// ATR header decoding and constants
pub mod format;
/// Image container and sector addressing
pub mod image;
/// Sector sources and host path helpers
pub mod io;

// Re-export common types
pub use error::{AtrError, Result};
pub use filesystem::{DirEntry, Directory, FileStream, FileType, RecursiveLister};
pub use format::{AtrHeader, Density};
pub use image::AtrImage;
pub use io::{is_atr_file, split_inner_path, FileSource, SectorSource};
