/// Atari DOS filesystem access

/// Directory iterator
pub mod directory;
/// Depth-first lister over the whole directory tree
pub mod lister;
/// Sequential reader over a file's sector chain
pub mod stream;

pub use directory::Directory;
pub use lister::RecursiveLister;
pub use stream::FileStream;

use crate::error::{AtrError, Result};
use crate::format::constants::*;

/// Status bit marking a locked (read-only) file
const STATUS_LOCKED: u8 = 0x20;

/// Sector link format of a file, selected by status bits 1-2
///
/// Each data sector ends with three trailer bytes: the next sector number
/// (high, low) and a used-byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Count byte below 128 means a full 125-byte sector, otherwise 128 + count.
    /// 10-bit sector links.
    Dos1,
    /// Literal count byte, 10-bit sector links (upper bits hold a file number)
    Dos2,
    /// Literal count byte, full 16-bit sector links
    MyDos,
}

impl FileType {
    /// Decode from a directory status byte
    pub fn from_status(status: u8) -> Self {
        match status & FILE_TYPE_MASK {
            0 => FileType::Dos1,
            FILE_TYPE_MASK => FileType::MyDos,
            _ => FileType::Dos2,
        }
    }

    /// Number of data bytes held by a sector with the given trailer count byte
    pub fn used_bytes(self, count: u8, bytes_per_sector: usize) -> Result<usize> {
        match self {
            FileType::Dos1 if count < 0x80 => Ok(125),
            FileType::Dos1 => Ok(usize::from(count - 0x80)),
            _ if usize::from(count) > bytes_per_sector => Err(AtrError::CorruptSector {
                count,
                bytes_per_sector,
            }),
            _ => Ok(usize::from(count)),
        }
    }

    /// Next sector number from the two link bytes of a trailer
    pub fn next_sector(self, high: u8, low: u8) -> u16 {
        let high = match self {
            FileType::MyDos => high,
            _ => high & 0x03,
        };
        u16::from_be_bytes([high, low])
    }

    /// Get a human-readable name for this file type
    pub fn name(&self) -> &'static str {
        match self {
            FileType::Dos1 => "DOS 1",
            FileType::Dos2 => "DOS 2",
            FileType::MyDos => "MyDOS",
        }
    }
}

/// Snapshot of a directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Display name ("NAME" or "NAME.EXT")
    pub name: String,
    /// Status byte with the lock and open-for-write bits masked off
    pub status: u8,
    /// Number of sectors the file occupies, as recorded in the entry
    pub sector_count: u16,
    /// First sector of the file or directory
    pub first_sector: u16,
    /// Locked (read-only) flag
    pub locked: bool,
}

impl DirEntry {
    /// Decode the fixed fields of a 16-byte entry and attach a display name
    pub(crate) fn from_raw(raw: &[u8], name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: raw[0] & STATUS_MASK,
            sector_count: u16::from_le_bytes([
                raw[DIR_ENTRY_COUNT_OFFSET],
                raw[DIR_ENTRY_COUNT_OFFSET + 1],
            ]),
            first_sector: u16::from_le_bytes([
                raw[DIR_ENTRY_START_OFFSET],
                raw[DIR_ENTRY_START_OFFSET + 1],
            ]),
            locked: raw[0] & STATUS_LOCKED != 0,
        }
    }

    /// Whether the entry is a subdirectory
    pub fn is_directory(&self) -> bool {
        self.status == STATUS_DIRECTORY
    }

    /// Sector link format of the file
    pub fn file_type(&self) -> FileType {
        FileType::from_status(self.status)
    }
}

/// Validate one space-padded filename field
///
/// Returns the length of the name part, or `None` if the field holds
/// characters other than `A-Z`, `0-9` and `_`, or a space followed by
/// anything but spaces.
pub fn filename_part_len(field: &[u8]) -> Option<usize> {
    let len = field.iter().position(|&c| c == b' ').unwrap_or(field.len());
    let valid_name = field[..len]
        .iter()
        .all(|&c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == b'_');
    let valid_padding = field[len..].iter().all(|&c| c == b' ');
    (valid_name && valid_padding).then_some(len)
}

/// Decode the 8.3 name of a 16-byte directory entry
pub fn decode_filename(raw: &[u8]) -> Option<String> {
    let name = &raw[DIR_ENTRY_NAME_OFFSET..DIR_ENTRY_NAME_OFFSET + DIR_ENTRY_NAME_LEN];
    let ext = &raw[DIR_ENTRY_EXT_OFFSET..DIR_ENTRY_EXT_OFFSET + DIR_ENTRY_EXT_LEN];

    let name_len = filename_part_len(name)?;
    let ext_len = filename_part_len(ext)?;
    if name_len == 0 && ext_len == 0 {
        return None;
    }

    // Validated as ASCII above
    let mut filename: String = name[..name_len].iter().map(|&c| c as char).collect();
    if ext_len > 0 {
        filename.push('.');
        filename.extend(ext[..ext_len].iter().map(|&c| c as char));
    }
    Some(filename)
}
