/// Forward-only iterator over a directory on an ATR image
///
/// A directory occupies eight consecutive 128-byte sectors of sixteen-byte
/// entries, so it holds at most 64 entries whatever the image density.

use crate::filesystem::{decode_filename, DirEntry};
use crate::format::constants::*;
use crate::image::AtrImage;
use crate::io::SectorSource;
use log::trace;
use std::fmt;

/// Iterator over the entries of one directory
pub struct Directory<'a, S> {
    disk: &'a AtrImage<S>,
    first_sector: u16,
    /// Current entry, `None` before the first advance
    index: Option<usize>,
    /// Set once the end marker, a read failure or the last slot is reached
    exhausted: bool,
    sector: [u8; DIRECTORY_SECTOR_SIZE],
    filename: String,
}

impl<'a, S: SectorSource> Directory<'a, S> {
    /// Open the root directory of a disk image
    pub fn root(disk: &'a AtrImage<S>) -> Self {
        Self::at_sector(disk, ROOT_DIRECTORY_SECTOR)
    }

    /// Open the subdirectory the given iterator currently points at
    ///
    /// The caller checks [`Directory::is_entry_directory`] first.
    pub fn open(parent: &Directory<'a, S>) -> Self {
        Self::at_sector(parent.disk, parent.entry_first_sector())
    }

    fn at_sector(disk: &'a AtrImage<S>, first_sector: u16) -> Self {
        Self {
            disk,
            first_sector,
            index: None,
            exhausted: false,
            sector: [0; DIRECTORY_SECTOR_SIZE],
            filename: String::new(),
        }
    }

    /// Re-open this iterator on the subdirectory it currently points at
    pub fn descend(&mut self) {
        self.first_sector = self.entry_first_sector();
        self.index = None;
        self.exhausted = false;
    }

    /// Disk image this directory belongs to
    pub fn disk(&self) -> &'a AtrImage<S> {
        self.disk
    }

    /// First sector of the directory being scanned
    pub fn first_sector(&self) -> u16 {
        self.first_sector
    }

    /// Advance to the next entry (file or directory)
    ///
    /// Returns the filename, which stays borrowed from the iterator until the
    /// next call, or `None` when the directory has no more entries.
    pub fn next_entry(&mut self) -> Option<&str> {
        if self.advance() {
            Some(&self.filename)
        } else {
            None
        }
    }

    /// Advance to the next valid entry, returning whether one was found
    pub(crate) fn advance(&mut self) -> bool {
        while !self.exhausted {
            let index = match self.index {
                None => 0,
                Some(i) if i + 1 >= MAX_DIR_ENTRIES => {
                    self.exhausted = true;
                    break;
                }
                Some(i) => i + 1,
            };
            self.index = Some(index);

            let offset = (index % ENTRIES_PER_SECTOR) * DIR_ENTRY_SIZE;
            if offset == 0 {
                let sector = u32::from(self.first_sector) + (index / ENTRIES_PER_SECTOR) as u32;
                if let Err(e) = self.disk.read_sector(sector, &mut self.sector) {
                    trace!("Directory at {}: sector {} unreadable: {}", self.first_sector, sector, e);
                    self.exhausted = true;
                    break;
                }
            }

            match self.sector[offset] & STATUS_MASK {
                STATUS_END => {
                    self.exhausted = true;
                    break;
                }
                STATUS_DOS1_FILE if self.disk.bytes_per_sector() != SECTOR_SIZE_SINGLE as usize => {
                    continue
                }
                STATUS_DOS1_FILE | STATUS_FILE | STATUS_OPEN_FILE | STATUS_WIDE_FILE
                | STATUS_DIRECTORY => {}
                status => {
                    trace!("Skipping entry {} with status 0x{:02X}", index, status);
                    continue;
                }
            }

            match decode_filename(&self.sector[offset..offset + DIR_ENTRY_SIZE]) {
                Some(name) => {
                    self.filename = name;
                    return true;
                }
                None => trace!("Skipping entry {} with invalid filename", index),
            }
        }
        false
    }

    /// Filename of the entry found by the last successful advance
    pub fn filename(&self) -> &str {
        &self.filename
    }

    fn entry_bytes(&self) -> &[u8] {
        let offset = (self.index.unwrap_or(0) % ENTRIES_PER_SECTOR) * DIR_ENTRY_SIZE;
        &self.sector[offset..offset + DIR_ENTRY_SIZE]
    }

    /// Masked status byte of the current entry
    pub fn entry_status(&self) -> u8 {
        self.entry_bytes()[0] & STATUS_MASK
    }

    /// Returns `true` if the current entry is a directory
    pub fn is_entry_directory(&self) -> bool {
        self.entry_status() == STATUS_DIRECTORY
    }

    /// First sector recorded in the current entry
    pub fn entry_first_sector(&self) -> u16 {
        let raw = self.entry_bytes();
        u16::from_le_bytes([raw[DIR_ENTRY_START_OFFSET], raw[DIR_ENTRY_START_OFFSET + 1]])
    }

    /// Snapshot of the current entry, if the last advance found one
    pub fn entry(&self) -> Option<DirEntry> {
        if self.exhausted || self.index.is_none() {
            return None;
        }
        Some(DirEntry::from_raw(self.entry_bytes(), &self.filename))
    }

    /// Advance to the entry with the given name
    ///
    /// Returns whether the entry is found. The match is exact and
    /// case-sensitive.
    pub fn find_entry(&mut self, filename: &str) -> bool {
        while self.advance() {
            if self.filename == filename {
                return true;
            }
        }
        false
    }

    /// Advance to the entry at a slash-separated path, descending into
    /// subdirectories in place
    ///
    /// Every component but the last must name a directory. The last one may
    /// name a file or a directory; callers that need a file check
    /// [`Directory::is_entry_directory`].
    pub fn find_entry_recursively(&mut self, path: &str) -> bool {
        let (dirs, leaf) = match path.rsplit_once('/') {
            Some((dirs, leaf)) => (Some(dirs), leaf),
            None => (None, path),
        };

        if let Some(dirs) = dirs {
            for dirname in dirs.split('/') {
                if dirname.len() > MAX_PATH_COMPONENT_LEN
                    || !self.find_entry(dirname)
                    || !self.is_entry_directory()
                {
                    return false;
                }
                self.descend();
            }
        }

        leaf.len() <= MAX_PATH_COMPONENT_LEN && self.find_entry(leaf)
    }

    /// Collect the remaining entries
    pub fn entries(&mut self) -> Vec<DirEntry> {
        let mut entries = Vec::new();
        while self.advance() {
            entries.push(DirEntry::from_raw(self.entry_bytes(), &self.filename));
        }
        entries
    }
}

impl<S> fmt::Debug for Directory<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("first_sector", &self.first_sector)
            .field("index", &self.index)
            .field("exhausted", &self.exhausted)
            .field("filename", &self.filename)
            .finish()
    }
}
