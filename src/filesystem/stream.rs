/// Sequential reader over a file's sector chain
///
/// Positioning is forward-only within the chain: seeking backwards rewinds
/// to the first sector and skips forward again.

use crate::error::{AtrError, Result};
use crate::filesystem::{Directory, FileType};
use crate::format::constants::{MAX_SECTOR_NUMBER, MAX_SECTOR_SIZE};
use crate::image::AtrImage;
use crate::io::SectorSource;
use log::{trace, warn};
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

/// Contents of a file on an ATR image
pub struct FileStream<'a, S> {
    disk: &'a AtrImage<S>,
    first_sector: u16,
    file_type: FileType,
    position: usize,
    next_sector: u16,
    sector: [u8; MAX_SECTOR_SIZE],
    /// Whether `sector` holds a sector of this file
    sector_loaded: bool,
    /// Read cursor within `sector`
    sector_offset: usize,
    /// Sectors loaded since the last rewind
    sectors_loaded: u32,
}

impl<'a, S: SectorSource> FileStream<'a, S> {
    /// Open the file the directory iterator points at
    pub fn open(directory: &Directory<'a, S>) -> Self {
        let mut stream = Self {
            disk: directory.disk(),
            first_sector: directory.entry_first_sector(),
            file_type: FileType::from_status(directory.entry_status()),
            position: 0,
            next_sector: 0,
            sector: [0; MAX_SECTOR_SIZE],
            sector_loaded: false,
            sector_offset: 0,
            sectors_loaded: 0,
        };
        stream.rewind();
        stream
    }

    /// Return to the start of the file
    pub fn rewind(&mut self) {
        self.position = 0;
        self.next_sector = self.first_sector;
        self.sector_loaded = false;
        self.sector_offset = 0;
        self.sectors_loaded = 0;
    }

    /// First sector of the file
    pub fn first_sector(&self) -> u16 {
        self.first_sector
    }

    /// Sector link format of the file
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Current position in the file
    pub fn position(&self) -> usize {
        self.position
    }

    /// Read up to `buffer.len()` bytes
    ///
    /// Returns the number of bytes read, which is short only at the end of
    /// the sector chain. A corrupt sector ends the read with the bytes read
    /// before it; the error is returned once nothing precedes it.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let length = buffer.len();
        self.transfer(Some(buffer), length)
    }

    /// Skip up to `length` bytes, returning how many were skipped
    pub fn skip(&mut self, length: usize) -> Result<usize> {
        self.transfer(None, length)
    }

    fn transfer(&mut self, mut buffer: Option<&mut [u8]>, mut length: usize) -> Result<usize> {
        let mut total = 0;
        while length > 0 {
            let used = match self.used_bytes() {
                Ok(used) => used,
                Err(e) => return partial(total, e),
            };

            if used <= self.sector_offset {
                match self.load_next_sector() {
                    Ok(true) => continue,
                    Ok(false) => break,
                    Err(e) => return partial(total, e),
                }
            }

            let got = (used - self.sector_offset).min(length);
            if let Some(buffer) = buffer.as_deref_mut() {
                buffer[total..total + got]
                    .copy_from_slice(&self.sector[self.sector_offset..self.sector_offset + got]);
            }
            self.position += got;
            self.sector_offset += got;
            total += got;
            length -= got;
        }
        Ok(total)
    }

    /// Valid bytes in the buffered sector according to its trailer
    fn used_bytes(&self) -> Result<usize> {
        if !self.sector_loaded {
            return Ok(0);
        }
        let bytes_per_sector = self.disk.bytes_per_sector();
        self.file_type
            .used_bytes(self.sector[bytes_per_sector - 1], bytes_per_sector)
    }

    /// Load the next sector of the chain; `false` at the end of the chain
    fn load_next_sector(&mut self) -> Result<bool> {
        if self.sectors_loaded >= MAX_SECTOR_NUMBER {
            warn!("Sector chain from {} does not terminate", self.first_sector);
            return Err(AtrError::CorruptChain {
                first_sector: self.first_sector,
            });
        }

        let bytes_per_sector = self.disk.bytes_per_sector();
        let sector = u32::from(self.next_sector);
        if let Err(e) = self
            .disk
            .read_sector(sector, &mut self.sector[..bytes_per_sector])
        {
            trace!("End of chain from {} at sector {}: {}", self.first_sector, sector, e);
            self.sector_loaded = false;
            self.sector_offset = 0;
            return Ok(false);
        }

        self.sectors_loaded += 1;
        self.sector_loaded = true;
        self.sector_offset = 0;
        self.next_sector = self.file_type.next_sector(
            self.sector[bytes_per_sector - 3],
            self.sector[bytes_per_sector - 2],
        );
        Ok(true)
    }

    /// Move to an absolute position
    ///
    /// Fails with [`AtrError::SeekOutOfRange`] if the file ends first.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        let to_skip = if position >= self.position {
            position - self.position
        } else {
            self.rewind();
            position
        };

        if self.skip(to_skip)? != to_skip {
            return Err(AtrError::SeekOutOfRange {
                requested: position,
                reached: self.position,
            });
        }
        Ok(())
    }

    /// Length of the file, found by reading to the end of the chain
    ///
    /// The current position is restored afterwards.
    pub fn length(&mut self) -> Result<usize> {
        let position = self.position;
        let length = position + self.skip(usize::MAX - position)?;
        self.set_position(position)?;
        Ok(length)
    }
}

fn partial(total: usize, err: AtrError) -> Result<usize> {
    if total > 0 {
        Ok(total)
    } else {
        Err(err)
    }
}

impl<S: SectorSource> Read for FileStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        FileStream::read(self, buf).map_err(io::Error::from)
    }
}

impl<S: SectorSource> Seek for FileStream<'_, S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(delta) => self.position as i128 + i128::from(delta),
            SeekFrom::End(delta) => self.length()? as i128 + i128::from(delta),
        };
        let target = usize::try_from(target).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative or overflowing position")
        })?;
        self.set_position(target)?;
        Ok(target as u64)
    }
}

impl<S> fmt::Debug for FileStream<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("first_sector", &self.first_sector)
            .field("file_type", &self.file_type)
            .field("position", &self.position)
            .field("next_sector", &self.next_sector)
            .field("sector_offset", &self.sector_offset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BPS: usize = 128;

    /// Single density image whose root holds one file `F` of the given status,
    /// with data sectors supplied as (sector number, contents)
    fn image(status: u8, first: u16, sectors: &[(u16, [u8; BPS])]) -> AtrImage<Vec<u8>> {
        let mut data = vec![0u8; 16 + 720 * BPS];
        data[..6].copy_from_slice(&[0x96, 0x02, 0x80, 0x16, 0x80, 0x00]);
        let root = 400 + (361 - 4) * BPS;
        data[root] = status;
        data[root + 3..root + 5].copy_from_slice(&first.to_le_bytes());
        data[root + 5..root + 16].copy_from_slice(b"F          ");
        for (no, contents) in sectors {
            let offset = 400 + (*no as usize - 4) * BPS;
            data[offset..offset + BPS].copy_from_slice(contents);
        }
        AtrImage::new(data).unwrap()
    }

    fn dos2_sector(fill: u8, next: u16, count: u8) -> [u8; BPS] {
        let mut s = [fill; BPS];
        s[BPS - 3] = (next >> 8) as u8;
        s[BPS - 2] = next as u8;
        s[BPS - 1] = count;
        s
    }

    #[test]
    fn test_read_chain() {
        let image = image(
            0x42,
            400,
            &[(400, dos2_sector(b'a', 401, 125)), (401, dos2_sector(b'b', 0, 10))],
        );
        let mut dir = image.root();
        assert!(dir.find_entry("F"));
        let mut stream = FileStream::open(&dir);

        let mut buf = vec![0u8; 200];
        assert_eq!(stream.read(&mut buf).unwrap(), 135);
        assert!(buf[..125].iter().all(|&b| b == b'a'));
        assert!(buf[125..135].iter().all(|&b| b == b'b'));
        assert_eq!(stream.position(), 135);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_dos1_short_sector_flag() {
        // Count byte without bit 7 means a full 125-byte sector
        let image = image(
            0x40,
            400,
            &[(400, dos2_sector(b'x', 401, 0x00)), (401, dos2_sector(b'y', 0, 0x80 | 3))],
        );
        let mut dir = image.root();
        assert!(dir.find_entry("F"));
        let mut stream = FileStream::open(&dir);
        assert_eq!(stream.file_type(), FileType::Dos1);
        assert_eq!(stream.length().unwrap(), 128);
    }

    #[test]
    fn test_corrupt_count_returns_partial_then_error() {
        let image = image(
            0x42,
            400,
            &[(400, dos2_sector(b'a', 401, 4)), (401, dos2_sector(b'b', 0, 200))],
        );
        let mut dir = image.root();
        assert!(dir.find_entry("F"));
        let mut stream = FileStream::open(&dir);

        let mut buf = [0u8; 16];
        assert_eq!(stream.read(&mut buf).unwrap(), 4);
        assert!(matches!(
            stream.read(&mut buf),
            Err(AtrError::CorruptSector { count: 200, .. })
        ));
    }

    #[test]
    fn test_self_linked_empty_sector_is_rejected() {
        let image = image(0x42, 400, &[(400, dos2_sector(0, 400, 0))]);
        let mut dir = image.root();
        assert!(dir.find_entry("F"));
        let mut stream = FileStream::open(&dir);
        let mut buf = [0u8; 1];
        assert!(matches!(
            stream.read(&mut buf),
            Err(AtrError::CorruptChain { first_sector: 400 })
        ));
    }

    #[test]
    fn test_seek_past_end() {
        let image = image(0x42, 400, &[(400, dos2_sector(b'a', 0, 20))]);
        let mut dir = image.root();
        assert!(dir.find_entry("F"));
        let mut stream = FileStream::open(&dir);

        assert!(stream.set_position(20).is_ok());
        assert!(matches!(
            stream.set_position(21),
            Err(AtrError::SeekOutOfRange {
                requested: 21,
                reached: 20
            })
        ));
    }

    #[test]
    fn test_std_io_seek_and_read() {
        let mut first = dos2_sector(0, 401, 125);
        for (i, b) in first.iter_mut().take(125).enumerate() {
            *b = i as u8;
        }
        let image = image(0x42, 400, &[(400, first), (401, dos2_sector(0xEE, 0, 5))]);
        let mut dir = image.root();
        assert!(dir.find_entry("F"));
        let mut stream = FileStream::open(&dir);

        assert_eq!(stream.seek(SeekFrom::End(-2)).unwrap(), 128);
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![0xEE, 0xEE]);

        assert_eq!(stream.seek(SeekFrom::Start(10)).unwrap(), 10);
        let mut byte = [0u8; 1];
        Read::read_exact(&mut stream, &mut byte).unwrap();
        assert_eq!(byte[0], 10);

        assert!(stream.seek(SeekFrom::Current(-20)).is_err());
    }
}
