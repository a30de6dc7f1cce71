//! Error types for zipkit

use std::io;

/// Result type for zipkit operations
pub type Result<T> = std::result::Result<T, ZipError>;

/// Error types that can occur during ZIP operations.
///
/// Variants line up with the error kinds the codec must distinguish:
/// structural (bad signature / short read), unsupported (disk layout or
/// compression method this crate does not implement), corruption (CRC-32
/// mismatch), invalid argument, and I/O.
#[derive(Debug)]
pub enum ZipError {
    /// I/O error from the underlying byte source or sink.
    Io(io::Error),
    /// A record's signature did not match the expected constant, or a
    /// fixed-size structural read came up short. `offset` is the byte
    /// position the record was expected to start at.
    Structural { kind: &'static str, offset: u64 },
    /// A feature this crate deliberately does not implement: multi-disk
    /// archives, an unknown compression method, writing a memory-backed
    /// archive, or one of the declared-but-unsupported mutations
    /// (rename/addFile/addEntry).
    Unsupported(String),
    /// Decompressed payload did not match its recorded CRC-32.
    Corruption { expected_crc32: u32, actual_crc32: u32 },
    /// A caller-supplied argument was rejected outright (e.g. an absolute
    /// entry name).
    InvalidArgument(String),
}

impl std::fmt::Display for ZipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZipError::Io(e) => write!(f, "I/O error: {}", e),
            ZipError::Structural { kind, offset } => {
                write!(f, "structural error decoding {} at offset {}", kind, offset)
            }
            ZipError::Unsupported(msg) => write!(f, "unsupported: {}", msg),
            ZipError::Corruption { expected_crc32, actual_crc32 } => write!(
                f,
                "CRC-32 mismatch: expected {:#010x}, got {:#010x}",
                expected_crc32, actual_crc32
            ),
            ZipError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for ZipError {}

impl From<io::Error> for ZipError {
    fn from(err: io::Error) -> Self {
        ZipError::Io(err)
    }
}
