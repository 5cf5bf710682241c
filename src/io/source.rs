/// Byte-range readers backing an ATR image

use crate::error::{AtrError, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

/// Random-access byte source an image is read from
///
/// A read either fills the whole buffer or fails; partial reads are errors.
pub trait SectorSource {
    /// Read `buffer.len()` bytes starting at `offset`
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()>;
}

impl SectorSource for [u8] {
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        let length = buffer.len();
        let out_of_range = || AtrError::OutOfRange { offset, length };
        let start = usize::try_from(offset).map_err(|_| out_of_range())?;
        let end = start.checked_add(length).ok_or_else(out_of_range)?;
        let data = self.get(start..end).ok_or_else(out_of_range)?;
        buffer.copy_from_slice(data);
        Ok(())
    }
}

impl SectorSource for Vec<u8> {
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        self.as_slice().read_at(offset, buffer)
    }
}

impl<T: SectorSource + ?Sized> SectorSource for &T {
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        (**self).read_at(offset, buffer)
    }
}

impl<T: SectorSource + ?Sized> SectorSource for Box<T> {
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        (**self).read_at(offset, buffer)
    }
}

/// Sector source reading from an open file
///
/// The file handle sits behind a mutex so the image stays shareable.
#[derive(Debug)]
pub struct FileSource {
    file: Mutex<File>,
    len: u64,
}

impl FileSource {
    /// Open a file for reading
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::open(path)?)
    }

    /// Wrap an already opened file
    pub fn new(file: File) -> Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self {
            file: Mutex::new(file),
            len,
        })
    }

    /// File length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the file is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl SectorSource for FileSource {
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        let end = offset.checked_add(buffer.len() as u64);
        if end.map_or(true, |end| end > self.len) {
            return Err(AtrError::OutOfRange {
                offset,
                length: buffer.len(),
            });
        }

        let mut file = self
            .file
            .lock()
            .map_err(|_| AtrError::Io(std::io::Error::other("file source lock poisoned")))?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buffer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_read_at() {
        let data: Vec<u8> = (0..32).collect();
        let mut buf = [0u8; 4];
        data.as_slice().read_at(8, &mut buf).unwrap();
        assert_eq!(buf, [8, 9, 10, 11]);
    }

    #[test]
    fn test_slice_read_past_end() {
        let data = vec![0u8; 16];
        let mut buf = [0u8; 4];
        let result = data.read_at(14, &mut buf);
        assert!(matches!(
            result,
            Err(AtrError::OutOfRange {
                offset: 14,
                length: 4
            })
        ));
    }

    #[test]
    fn test_huge_offset_does_not_overflow() {
        let data = vec![0u8; 16];
        let mut buf = [0u8; 4];
        assert!(data.read_at(u64::MAX - 1, &mut buf).is_err());
    }

    #[test]
    fn test_reference_and_box_sources() {
        let data = vec![1u8, 2, 3, 4];
        let mut buf = [0u8; 2];

        let by_ref: &Vec<u8> = &data;
        by_ref.read_at(1, &mut buf).unwrap();
        assert_eq!(buf, [2, 3]);

        let boxed: Box<dyn SectorSource> = Box::new(data.clone());
        boxed.read_at(2, &mut buf).unwrap();
        assert_eq!(buf, [3, 4]);
    }

    #[test]
    fn test_file_source() {
        let path = std::env::temp_dir().join(format!("atrmanager-source-{}.bin", std::process::id()));
        std::fs::write(&path, (0u8..64).collect::<Vec<_>>()).unwrap();

        let source = FileSource::open(&path).unwrap();
        assert_eq!(source.len(), 64);

        let mut buf = [0u8; 3];
        source.read_at(60, &mut buf).unwrap();
        assert_eq!(buf, [60, 61, 62]);
        assert!(source.read_at(62, &mut buf).is_err());

        std::fs::remove_file(&path).unwrap();
    }
}
