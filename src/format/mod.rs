/// ATR header decoding and format constants

/// Format constants
pub mod constants;

pub use constants::*;

use crate::error::{AtrError, Result};

/// Sector density declared by the ATR header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    /// 128-byte sectors (single and enhanced density)
    Single,
    /// 256-byte sectors
    Double,
}

impl Density {
    /// Get a human-readable name for this density
    pub fn name(&self) -> &'static str {
        match self {
            Density::Single => "Single (128 bytes/sector)",
            Density::Double => "Double (256 bytes/sector)",
        }
    }

    /// Sector size in bytes
    pub fn bytes_per_sector(&self) -> usize {
        match self {
            Density::Single => SECTOR_SIZE_SINGLE as usize,
            Density::Double => SECTOR_SIZE_DOUBLE as usize,
        }
    }
}

/// Decoded ATR header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtrHeader {
    /// Sector density
    pub density: Density,
    /// Header bytes 2-3 (image size in paragraphs, low word)
    pub size_field: u16,
    /// Byte offset of logical sector 4
    pub sector4_offset: u64,
}

impl AtrHeader {
    /// Decode the first header bytes of an image
    ///
    /// Double density images whose size field has a zero low nibble are taken
    /// to store the three boot sectors padded to 256 bytes; every other image
    /// packs them at 128 bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_READ_SIZE {
            return Err(AtrError::invalid_format("ATR header too short"));
        }

        if !detect_format(data) {
            return Err(AtrError::invalid_format("Missing ATR signature"));
        }

        let size_field = u16::from_le_bytes([
            data[HEADER_SIZE_OFFSET],
            data[HEADER_SIZE_OFFSET + 1],
        ]);
        let bytes_per_sector = u16::from_le_bytes([
            data[HEADER_SECTOR_SIZE_OFFSET],
            data[HEADER_SECTOR_SIZE_OFFSET + 1],
        ]);

        let (density, sector4_offset) = match bytes_per_sector {
            SECTOR_SIZE_SINGLE => (Density::Single, SECTOR4_OFFSET_PACKED),
            SECTOR_SIZE_DOUBLE if data[HEADER_SIZE_OFFSET] & 0x0F == 0 => {
                (Density::Double, SECTOR4_OFFSET_PADDED)
            }
            SECTOR_SIZE_DOUBLE => (Density::Double, SECTOR4_OFFSET_PACKED),
            other => return Err(AtrError::UnsupportedSectorSize(other)),
        };

        Ok(Self {
            density,
            size_field,
            sector4_offset,
        })
    }

    /// Sector size in bytes
    pub fn bytes_per_sector(&self) -> usize {
        self.density.bytes_per_sector()
    }

    /// Whether the boot sectors are padded to the full sector size
    pub fn has_padded_boot_sectors(&self) -> bool {
        self.sector4_offset == SECTOR4_OFFSET_PADDED
    }
}

/// Check for the ATR signature
pub fn detect_format(magic: &[u8]) -> bool {
    magic.starts_with(&ATR_SIGNATURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(size_low: u8, bytes_per_sector: u16) -> [u8; 6] {
        let bps = bytes_per_sector.to_le_bytes();
        [0x96, 0x02, size_low, 0x00, bps[0], bps[1]]
    }

    #[test]
    fn test_detect_format() {
        assert!(detect_format(&[0x96, 0x02, 0, 0]));
        assert!(!detect_format(b"MV - CPC"));
        assert!(!detect_format(&[0x96]));
    }

    #[test]
    fn test_parse_single_density() {
        let h = AtrHeader::parse(&header(0x80, 128)).unwrap();
        assert_eq!(h.density, Density::Single);
        assert_eq!(h.bytes_per_sector(), 128);
        assert_eq!(h.sector4_offset, 400);
        assert!(!h.has_padded_boot_sectors());
    }

    #[test]
    fn test_single_density_ignores_size_nibble() {
        let h = AtrHeader::parse(&header(0x00, 128)).unwrap();
        assert_eq!(h.sector4_offset, 400);
    }

    #[test]
    fn test_parse_double_density_padded() {
        let h = AtrHeader::parse(&header(0xF0, 256)).unwrap();
        assert_eq!(h.density, Density::Double);
        assert_eq!(h.bytes_per_sector(), 256);
        assert_eq!(h.sector4_offset, 784);
        assert!(h.has_padded_boot_sectors());
    }

    #[test]
    fn test_parse_double_density_packed() {
        let h = AtrHeader::parse(&header(0xE8, 256)).unwrap();
        assert_eq!(h.sector4_offset, 400);
    }

    #[test]
    fn test_parse_size_field() {
        let h = AtrHeader::parse(&[0x96, 0x02, 0x80, 0x16, 0x80, 0x00]).unwrap();
        assert_eq!(h.size_field, 0x1680);
    }

    #[test]
    fn test_parse_bad_magic() {
        let result = AtrHeader::parse(&[0x96, 0x03, 0, 0, 0x80, 0]);
        assert!(matches!(result, Err(AtrError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_unsupported_sector_size() {
        let result = AtrHeader::parse(&header(0, 512));
        assert!(matches!(result, Err(AtrError::UnsupportedSectorSize(512))));
    }

    #[test]
    fn test_parse_truncated() {
        let result = AtrHeader::parse(&[0x96, 0x02, 0x80]);
        assert!(matches!(result, Err(AtrError::InvalidFormat(_))));
    }
}
