use thiserror::Error;

/// Result type alias for ATR operations
pub type Result<T> = std::result::Result<T, AtrError>;

/// Errors that can occur when working with ATR files
#[derive(Debug, Error)]
pub enum AtrError {
    /// I/O error occurred while reading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unrecognized ATR file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Header declares a sector size other than 128 or 256
    #[error("Unsupported sector size: {0} bytes")]
    UnsupportedSectorSize(u16),

    /// Logical sector cannot be addressed with the requested length
    #[error("Invalid sector {sector} (length {length})")]
    InvalidSector {
        /// Logical sector number
        sector: u32,
        /// Requested read length
        length: usize,
    },

    /// Byte range lies outside the sector source
    #[error("Read of {length} bytes at offset {offset} is out of range")]
    OutOfRange {
        /// Byte offset into the image
        offset: u64,
        /// Requested read length
        length: usize,
    },

    /// Data sector trailer claims more bytes than the sector holds
    #[error("Corrupt sector: trailer count {count} exceeds {bytes_per_sector} bytes")]
    CorruptSector {
        /// Trailer byte count
        count: u8,
        /// Sector size of the image
        bytes_per_sector: usize,
    },

    /// Sector chain is longer than any disk can address
    #[error("Corrupt sector chain starting at sector {first_sector}")]
    CorruptChain {
        /// First sector of the file
        first_sector: u16,
    },

    /// Seek target lies past the end of the file
    #[error("Seek to {requested} out of range (stopped at {reached})")]
    SeekOutOfRange {
        /// Requested position
        requested: usize,
        /// Position actually reached
        reached: usize,
    },

    /// File not found in filesystem
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Path resolves to a directory where a file is required
    #[error("Not a file: {0}")]
    NotAFile(String),
}

impl AtrError {
    /// Create an invalid format error
    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        AtrError::InvalidFormat(message.into())
    }

    /// Create a file not found error
    pub fn not_found<S: Into<String>>(path: S) -> Self {
        AtrError::FileNotFound(path.into())
    }

    /// Whether this error marks malformed image content rather than a failed read
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            AtrError::InvalidFormat(_)
                | AtrError::UnsupportedSectorSize(_)
                | AtrError::CorruptSector { .. }
                | AtrError::CorruptChain { .. }
        )
    }
}

impl From<AtrError> for std::io::Error {
    fn from(err: AtrError) -> Self {
        match err {
            AtrError::Io(e) => e,
            AtrError::FileNotFound(_) => std::io::Error::new(std::io::ErrorKind::NotFound, err),
            AtrError::SeekOutOfRange { .. } => {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
            }
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}
