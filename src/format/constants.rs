/// ATR format magic bytes and constants

/// ATR signature (0x0296 little-endian, "NICKATARI" checksum word)
pub const ATR_SIGNATURE: [u8; 2] = [0x96, 0x02];

/// Number of header bytes decoded when opening an image
pub const HEADER_READ_SIZE: usize = 6;

/// Size of the full ATR header preceding sector 1
pub const ATR_HEADER_SIZE: u64 = 16;

/// Offset of the image size field (low word, 16-byte paragraphs)
pub const HEADER_SIZE_OFFSET: usize = 2;

/// Offset of the bytes-per-sector field
pub const HEADER_SECTOR_SIZE_OFFSET: usize = 4;

/// Single density sector size
pub const SECTOR_SIZE_SINGLE: u16 = 128;

/// Double density sector size
pub const SECTOR_SIZE_DOUBLE: u16 = 256;

/// Largest supported sector size
pub const MAX_SECTOR_SIZE: usize = SECTOR_SIZE_DOUBLE as usize;

/// Boot sectors 1-3 are always stored as 128 bytes
pub const BOOT_SECTOR_SIZE: usize = 128;

/// Number of boot sectors
pub const BOOT_SECTOR_COUNT: u32 = 3;

/// Byte offset of sector 4 when boot sectors are packed at 128 bytes
pub const SECTOR4_OFFSET_PACKED: u64 = ATR_HEADER_SIZE + 3 * 128;

/// Byte offset of sector 4 when boot sectors are padded to 256 bytes
pub const SECTOR4_OFFSET_PADDED: u64 = ATR_HEADER_SIZE + 3 * 256;

/// First sector of the root directory
pub const ROOT_DIRECTORY_SECTOR: u16 = 361;

/// Sectors occupied by every directory
pub const DIRECTORY_SECTORS: usize = 8;

/// Directory sectors are always read as 128 bytes
pub const DIRECTORY_SECTOR_SIZE: usize = 128;

/// Size of a directory entry
pub const DIR_ENTRY_SIZE: usize = 16;

/// Directory entries per directory sector
pub const ENTRIES_PER_SECTOR: usize = DIRECTORY_SECTOR_SIZE / DIR_ENTRY_SIZE;

/// Maximum entries in a directory
pub const MAX_DIR_ENTRIES: usize = DIRECTORY_SECTORS * ENTRIES_PER_SECTOR;

/// Offset of the sector count in a directory entry
pub const DIR_ENTRY_COUNT_OFFSET: usize = 1;

/// Offset of the first sector in a directory entry
pub const DIR_ENTRY_START_OFFSET: usize = 3;

/// Offset of the filename in a directory entry
pub const DIR_ENTRY_NAME_OFFSET: usize = 5;

/// Length of the filename field
pub const DIR_ENTRY_NAME_LEN: usize = 8;

/// Offset of the extension in a directory entry
pub const DIR_ENTRY_EXT_OFFSET: usize = 13;

/// Length of the extension field
pub const DIR_ENTRY_EXT_LEN: usize = 3;

/// Longest name accepted in a path component ("FILENAME.EXT")
pub const MAX_PATH_COMPONENT_LEN: usize = DIR_ENTRY_NAME_LEN + 1 + DIR_ENTRY_EXT_LEN;

/// Status bits relevant to enumeration (drops the locked and open-for-write bits)
pub const STATUS_MASK: u8 = 0xD7;

/// Status bits selecting the sector link format of a file
pub const FILE_TYPE_MASK: u8 = 0x06;

/// Status: end of directory
pub const STATUS_END: u8 = 0x00;

/// Status: file written by a single-density-only DOS
pub const STATUS_DOS1_FILE: u8 = 0x40;

/// Status: regular file
pub const STATUS_FILE: u8 = 0x42;

/// Status: file still open for output
pub const STATUS_OPEN_FILE: u8 = 0x03;

/// Status: file with 16-bit sector links
pub const STATUS_WIDE_FILE: u8 = 0x46;

/// Status: subdirectory
pub const STATUS_DIRECTORY: u8 = 0x10;

/// Maximum depth of the recursive lister's directory stack
pub const MAX_DIRECTORY_DEPTH: usize = 20;

/// Highest addressable logical sector
pub const MAX_SECTOR_NUMBER: u32 = u16::MAX as u32;

/// Check whether a header sector size is supported
#[inline]
pub fn is_supported_sector_size(bytes: u16) -> bool {
    matches!(bytes, SECTOR_SIZE_SINGLE | SECTOR_SIZE_DOUBLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector4_offsets() {
        assert_eq!(SECTOR4_OFFSET_PACKED, 400);
        assert_eq!(SECTOR4_OFFSET_PADDED, 784);
    }

    #[test]
    fn test_directory_geometry() {
        assert_eq!(ENTRIES_PER_SECTOR, 8);
        assert_eq!(MAX_DIR_ENTRIES, 64);
        assert_eq!(MAX_PATH_COMPONENT_LEN, 12);
    }

    #[test]
    fn test_supported_sector_sizes() {
        assert!(is_supported_sector_size(128));
        assert!(is_supported_sector_size(256));
        assert!(!is_supported_sector_size(0));
        assert!(!is_supported_sector_size(512));
    }

    #[test]
    fn test_status_mask_ignores_lock_bits() {
        // Locked (0x20) and open-for-write (0x08) never affect the masked status
        assert_eq!((STATUS_FILE | 0x20 | 0x08) & STATUS_MASK, STATUS_FILE);
        assert_eq!(STATUS_DIRECTORY & STATUS_MASK, STATUS_DIRECTORY);
    }
}
