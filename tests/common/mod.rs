//! In-memory ATR image construction for tests
#![allow(dead_code)]

/// Status of a regular DOS 2 file
pub const FILE: u8 = 0x42;
/// Status of a file with 16-bit sector links
pub const WIDE_FILE: u8 = 0x46;
/// Status of a subdirectory
pub const DIRECTORY: u8 = 0x10;

/// First sector of the root directory
pub const ROOT: u16 = 361;

/// Builds ATR images sector by sector
pub struct AtrBuilder {
    bytes_per_sector: usize,
    padded_boot: bool,
    data: Vec<u8>,
    next_free: u16,
}

impl AtrBuilder {
    /// Blank image with the given geometry
    pub fn new(bytes_per_sector: usize, sectors: u16, padded_boot: bool) -> Self {
        let boot_size = if padded_boot { bytes_per_sector } else { 128 };
        let len = 16 + 3 * boot_size + (sectors as usize - 3) * bytes_per_sector;
        let mut data = vec![0u8; len];

        let paragraphs = ((len - 16) / 16) as u32;
        data[0] = 0x96;
        data[1] = 0x02;
        data[2] = paragraphs as u8;
        data[3] = (paragraphs >> 8) as u8;
        data[4..6].copy_from_slice(&(bytes_per_sector as u16).to_le_bytes());
        data[6] = (paragraphs >> 16) as u8;

        Self {
            bytes_per_sector,
            padded_boot,
            data,
            next_free: 400,
        }
    }

    /// 720-sector single density image
    pub fn single() -> Self {
        Self::new(128, 720, false)
    }

    /// 720-sector double density image with padded boot sectors
    pub fn double() -> Self {
        Self::new(256, 720, true)
    }

    /// Continue allocating data sectors from `sector`
    pub fn allocate_from(&mut self, sector: u16) -> &mut Self {
        self.next_free = sector;
        self
    }

    pub fn sector_offset(&self, sector: u16) -> usize {
        let sector = sector as usize;
        if sector <= 3 {
            return 16 + (sector - 1) * 128;
        }
        let boot_size = if self.padded_boot { self.bytes_per_sector } else { 128 };
        16 + 3 * boot_size + (sector - 4) * self.bytes_per_sector
    }

    pub fn write_sector(&mut self, sector: u16, bytes: &[u8]) {
        let offset = self.sector_offset(sector);
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn allocate(&mut self, count: u16) -> u16 {
        let first = self.next_free;
        self.next_free += count;
        first
    }

    /// Write a raw 16-byte directory entry into `slot` of a directory
    pub fn raw_entry(&mut self, dir: u16, slot: usize, entry: [u8; 16]) {
        let offset = self.sector_offset(dir + (slot / 8) as u16) + (slot % 8) * 16;
        self.data[offset..offset + 16].copy_from_slice(&entry);
    }

    /// Write a directory entry with an 8.3 name
    pub fn entry(&mut self, dir: u16, slot: usize, status: u8, name: &str, first: u16, count: u16) {
        self.raw_entry(dir, slot, encode_entry(status, name, first, count));
    }

    /// Add a file with the given contents, returning its first sector
    pub fn file(&mut self, dir: u16, slot: usize, name: &str, contents: &[u8]) -> u16 {
        self.file_with_status(dir, slot, FILE, name, contents)
    }

    /// Add a file with an explicit status byte, returning its first sector
    pub fn file_with_status(
        &mut self,
        dir: u16,
        slot: usize,
        status: u8,
        name: &str,
        contents: &[u8],
    ) -> u16 {
        let bps = self.bytes_per_sector;
        let per_sector = bps - 3;
        let chunks: Vec<&[u8]> = if contents.is_empty() {
            vec![contents]
        } else {
            contents.chunks(per_sector).collect()
        };
        let first = self.allocate(chunks.len() as u16);

        for (i, chunk) in chunks.iter().enumerate() {
            let sector = first + i as u16;
            let next = if i + 1 < chunks.len() { sector + 1 } else { 0 };
            let mut raw = vec![0u8; bps];
            raw[..chunk.len()].copy_from_slice(chunk);
            raw[bps - 3] = if status & 0x06 == 0x06 {
                (next >> 8) as u8
            } else {
                ((slot as u8) << 2) | ((next >> 8) as u8 & 0x03)
            };
            raw[bps - 2] = next as u8;
            raw[bps - 1] = chunk.len() as u8;
            self.write_sector(sector, &raw);
        }

        self.entry(dir, slot, status, name, first, chunks.len() as u16);
        first
    }

    /// Add an empty subdirectory, returning its first sector
    pub fn directory(&mut self, dir: u16, slot: usize, name: &str) -> u16 {
        let first = self.allocate(8);
        self.entry(dir, slot, DIRECTORY, name, first, 8);
        first
    }

    pub fn build(&self) -> Vec<u8> {
        self.data.clone()
    }
}

/// Encode a directory entry, space-padding the 8.3 name
pub fn encode_entry(status: u8, name: &str, first: u16, count: u16) -> [u8; 16] {
    let (base, ext) = name.split_once('.').unwrap_or((name, ""));
    let mut raw = [b' '; 16];
    raw[0] = status;
    raw[1..3].copy_from_slice(&count.to_le_bytes());
    raw[3..5].copy_from_slice(&first.to_le_bytes());
    raw[5..5 + base.len()].copy_from_slice(base.as_bytes());
    raw[13..13 + ext.len()].copy_from_slice(ext.as_bytes());
    raw
}

/// Deterministic test contents
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 251) as u8).collect()
}
