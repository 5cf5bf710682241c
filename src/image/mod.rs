/// ATR image container and sector addressing

use crate::error::{AtrError, Result};
use crate::filesystem::{DirEntry, Directory, FileStream, RecursiveLister};
use crate::format::constants::*;
use crate::format::AtrHeader;
use crate::io::{FileSource, SectorSource};
use log::debug;
use std::path::Path;

/// ATR disk image over a sector source
///
/// The image never changes after it is opened, so any number of directory
/// iterators and file streams may borrow it at once.
#[derive(Debug)]
pub struct AtrImage<S> {
    source: S,
    header: AtrHeader,
}

impl AtrImage<FileSource> {
    /// Open an ATR file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(FileSource::open(path)?)
    }
}

impl<S: SectorSource> AtrImage<S> {
    /// Open an ATR image from a sector source
    pub fn new(source: S) -> Result<Self> {
        let mut header = [0u8; HEADER_READ_SIZE];
        source.read_at(0, &mut header)?;
        let header = AtrHeader::parse(&header)?;

        debug!(
            "Opened ATR image: {} bytes/sector, sector 4 at offset {}",
            header.bytes_per_sector(),
            header.sector4_offset
        );

        Ok(Self { source, header })
    }

    /// Get the decoded header
    pub fn header(&self) -> &AtrHeader {
        &self.header
    }

    /// Returns sector size in bytes
    pub fn bytes_per_sector(&self) -> usize {
        self.header.bytes_per_sector()
    }

    /// Byte offset of logical sector 4
    pub fn sector4_offset(&self) -> u64 {
        self.header.sector4_offset
    }

    /// Get the underlying sector source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Byte offset of a logical sector
    ///
    /// Sectors 1-3 are always 128 bytes, so reading more than that from them
    /// is rejected along with sector 0.
    pub fn sector_offset(&self, sector: u32, length: usize) -> Result<u64> {
        if sector <= BOOT_SECTOR_COUNT {
            if sector < 1 || length > BOOT_SECTOR_SIZE {
                return Err(AtrError::InvalidSector { sector, length });
            }
            return Ok(u64::from(sector) * BOOT_SECTOR_SIZE as u64 - 112);
        }
        Ok(self.header.sector4_offset
            + u64::from(sector - (BOOT_SECTOR_COUNT + 1)) * self.bytes_per_sector() as u64)
    }

    /// Read the start of a logical sector into `buffer`
    pub fn read_sector(&self, sector: u32, buffer: &mut [u8]) -> Result<()> {
        let offset = self.sector_offset(sector, buffer.len())?;
        self.source.read_at(offset, buffer)
    }

    /// Open the root directory
    pub fn root(&self) -> Directory<'_, S> {
        Directory::root(self)
    }

    /// Start a depth-first listing of every file on the image
    pub fn files(&self) -> RecursiveLister<'_, S> {
        RecursiveLister::new(self)
    }

    /// Full paths of every file on the image, in listing order
    pub fn list_files(&self) -> Vec<String> {
        let mut lister = self.files();
        let mut files = Vec::new();
        while let Some(path) = lister.next_file() {
            files.push(path.to_string());
        }
        files
    }

    /// Find an entry by slash-separated path
    ///
    /// Returns an iterator positioned at the entry, or `None` if any
    /// component is missing.
    pub fn find(&self, path: &str) -> Option<Directory<'_, S>> {
        let mut directory = self.root();
        directory
            .find_entry_recursively(path)
            .then_some(directory)
    }

    /// List a directory by path; an empty path lists the root
    pub fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let path = path.trim_matches('/');
        let mut directory = if path.is_empty() {
            self.root()
        } else {
            let found = self.find(path).ok_or_else(|| AtrError::not_found(path))?;
            if !found.is_entry_directory() {
                return Err(AtrError::not_found(path));
            }
            Directory::open(&found)
        };
        Ok(directory.entries())
    }

    /// Open a file by slash-separated path
    pub fn open_stream(&self, path: &str) -> Result<FileStream<'_, S>> {
        let directory = self.find(path).ok_or_else(|| AtrError::not_found(path))?;
        if directory.is_entry_directory() {
            return Err(AtrError::NotAFile(path.to_string()));
        }
        Ok(FileStream::open(&directory))
    }

    /// Read a whole file by slash-separated path
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut stream = self.open_stream(path)?;
        let mut data = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);
        }
        Ok(data)
    }
}
