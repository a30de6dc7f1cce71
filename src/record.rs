//! On-disk record layouts for the three PKWARE record families: Local File
//! Header (LFH), Central Directory File Header (CDFH), and End-of-Central-
//! Directory Record (EOCD).
//!
//! Each `decode_fixed` reads only the fixed-width prefix and hands back the
//! variable-length tail lengths so the caller can read `name`/`extra`/
//! `comment` in the canonical order; each `encode_fixed` writes only the
//! fixed prefix, leaving the caller to append the tails. Everything here is
//! a pure byte-slice transform — no I/O, matching the record codec's
//! "stateless" contract.

use crate::error::ZipError;

pub const LFH_SIGNATURE: u32 = 0x04034b50;
pub const CDFH_SIGNATURE: u32 = 0x02014b50;
pub const EOCD_SIGNATURE: u32 = 0x06054b50;

pub const LFH_FIXED_SIZE: usize = 30;
pub const CDFH_FIXED_SIZE: usize = 46;
pub const EOCD_FIXED_SIZE: usize = 22;

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Local File Header, fixed prefix plus the name/extra tails.
#[derive(Debug, Clone)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub dos_datetime: u32,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name: Vec<u8>,
    pub extra_field: Vec<u8>,
}

/// The fixed-prefix fields of an LFH, as read before the name/extra tails
/// are known to exist.
#[derive(Debug)]
pub struct LfhFixed {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub dos_datetime: u32,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_length: u16,
    pub extra_field_length: u16,
}

impl LfhFixed {
    /// Decodes the 30-byte fixed prefix of a Local File Header.
    /// `offset` is the archive-relative byte position this record was read
    /// from, used only for error reporting.
    pub fn decode(buf: &[u8], offset: u64) -> Result<Self, ZipError> {
        if buf.len() < LFH_FIXED_SIZE {
            return Err(ZipError::Structural { kind: "LocalFileHeader", offset });
        }
        let signature = read_u32(buf, 0);
        if signature != LFH_SIGNATURE {
            return Err(ZipError::Structural { kind: "LocalFileHeader", offset });
        }
        Ok(LfhFixed {
            version_needed: read_u16(buf, 4),
            flags: read_u16(buf, 6),
            compression_method: read_u16(buf, 8),
            dos_datetime: read_u32(buf, 10),
            crc32: read_u32(buf, 14),
            compressed_size: read_u32(buf, 18),
            uncompressed_size: read_u32(buf, 22),
            name_length: read_u16(buf, 26),
            extra_field_length: read_u16(buf, 28),
        })
    }

    /// Attaches the previously-read name/extra tails, completing the record.
    pub fn with_tail(self, name: Vec<u8>, extra_field: Vec<u8>) -> LocalFileHeader {
        LocalFileHeader {
            version_needed: self.version_needed,
            flags: self.flags,
            compression_method: self.compression_method,
            dos_datetime: self.dos_datetime,
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            name,
            extra_field,
        }
    }
}

impl LocalFileHeader {
    /// Encodes the 30-byte fixed prefix. Name/extra-field lengths are
    /// derived from the buffers actually held, so they can never drift out
    /// of sync with the tails the caller appends afterward.
    pub fn encode_fixed(&self) -> [u8; LFH_FIXED_SIZE] {
        let mut buf = Vec::with_capacity(LFH_FIXED_SIZE);
        push_u32(&mut buf, LFH_SIGNATURE);
        push_u16(&mut buf, self.version_needed);
        push_u16(&mut buf, self.flags);
        push_u16(&mut buf, self.compression_method);
        push_u32(&mut buf, self.dos_datetime);
        push_u32(&mut buf, self.crc32);
        push_u32(&mut buf, self.compressed_size);
        push_u32(&mut buf, self.uncompressed_size);
        push_u16(&mut buf, self.name.len() as u16);
        push_u16(&mut buf, self.extra_field.len() as u16);
        buf.try_into().expect("fixed-size buffer")
    }
}

/// Central Directory File Header, fixed prefix plus name/extra/comment
/// tails. `offset_of_local_header` is mutable because `writeArchive`
/// back-patches it once the local header's emitted offset is known.
#[derive(Debug, Clone)]
pub struct CentralDirectoryFileHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub dos_datetime: u32,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub disk_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub offset_of_local_header: u32,
    pub name: Vec<u8>,
    pub extra_field: Vec<u8>,
    pub comment: Vec<u8>,
}

pub struct CdfhFixed {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub dos_datetime: u32,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_length: u16,
    pub extra_field_length: u16,
    pub comment_length: u16,
    pub disk_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub offset_of_local_header: u32,
}

impl CdfhFixed {
    /// Decodes the 46-byte fixed prefix of a Central Directory File Header.
    pub fn decode(buf: &[u8], offset: u64) -> Result<Self, ZipError> {
        if buf.len() < CDFH_FIXED_SIZE {
            return Err(ZipError::Structural { kind: "CentralDirectoryFileHeader", offset });
        }
        let signature = read_u32(buf, 0);
        if signature != CDFH_SIGNATURE {
            return Err(ZipError::Structural { kind: "CentralDirectoryFileHeader", offset });
        }
        Ok(CdfhFixed {
            version_made_by: read_u16(buf, 4),
            version_needed: read_u16(buf, 6),
            flags: read_u16(buf, 8),
            compression_method: read_u16(buf, 10),
            dos_datetime: read_u32(buf, 12),
            crc32: read_u32(buf, 16),
            compressed_size: read_u32(buf, 20),
            uncompressed_size: read_u32(buf, 24),
            name_length: read_u16(buf, 28),
            extra_field_length: read_u16(buf, 30),
            comment_length: read_u16(buf, 32),
            disk_start: read_u16(buf, 34),
            internal_attrs: read_u16(buf, 36),
            external_attrs: read_u32(buf, 38),
            offset_of_local_header: read_u32(buf, 42),
        })
    }

    pub fn with_tail(
        self,
        name: Vec<u8>,
        extra_field: Vec<u8>,
        comment: Vec<u8>,
    ) -> CentralDirectoryFileHeader {
        CentralDirectoryFileHeader {
            version_made_by: self.version_made_by,
            version_needed: self.version_needed,
            flags: self.flags,
            compression_method: self.compression_method,
            dos_datetime: self.dos_datetime,
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            disk_start: self.disk_start,
            internal_attrs: self.internal_attrs,
            external_attrs: self.external_attrs,
            offset_of_local_header: self.offset_of_local_header,
            name,
            extra_field,
            comment,
        }
    }
}

impl CentralDirectoryFileHeader {
    pub fn encode_fixed(&self) -> [u8; CDFH_FIXED_SIZE] {
        let mut buf = Vec::with_capacity(CDFH_FIXED_SIZE);
        push_u32(&mut buf, CDFH_SIGNATURE);
        push_u16(&mut buf, self.version_made_by);
        push_u16(&mut buf, self.version_needed);
        push_u16(&mut buf, self.flags);
        push_u16(&mut buf, self.compression_method);
        push_u32(&mut buf, self.dos_datetime);
        push_u32(&mut buf, self.crc32);
        push_u32(&mut buf, self.compressed_size);
        push_u32(&mut buf, self.uncompressed_size);
        push_u16(&mut buf, self.name.len() as u16);
        push_u16(&mut buf, self.extra_field.len() as u16);
        push_u16(&mut buf, self.comment.len() as u16);
        push_u16(&mut buf, self.disk_start);
        push_u16(&mut buf, self.internal_attrs);
        push_u32(&mut buf, self.external_attrs);
        push_u32(&mut buf, self.offset_of_local_header);
        buf.try_into().expect("fixed-size buffer")
    }
}

/// End-of-Central-Directory Record, fixed prefix plus the trailing
/// archive comment.
#[derive(Debug, Clone)]
pub struct EndOfCentralDirectoryRecord {
    pub this_disk: u16,
    pub disk_with_cd: u16,
    pub entries_this_disk: u16,
    pub total_entries: u16,
    pub central_directory_size: u32,
    pub central_directory_offset: u32,
    pub comment: Vec<u8>,
}

pub struct EocdFixed {
    pub this_disk: u16,
    pub disk_with_cd: u16,
    pub entries_this_disk: u16,
    pub total_entries: u16,
    pub central_directory_size: u32,
    pub central_directory_offset: u32,
    pub comment_length: u16,
}

impl EocdFixed {
    /// Decodes the 22-byte fixed prefix of an End-of-Central-Directory
    /// Record. Does not itself validate the signature; callers performing
    /// the backward scan check the signature on every window before
    /// committing to this decode.
    pub fn decode(buf: &[u8], offset: u64) -> Result<Self, ZipError> {
        if buf.len() < EOCD_FIXED_SIZE {
            return Err(ZipError::Structural { kind: "EndOfCentralDirectoryRecord", offset });
        }
        let signature = read_u32(buf, 0);
        if signature != EOCD_SIGNATURE {
            return Err(ZipError::Structural { kind: "EndOfCentralDirectoryRecord", offset });
        }
        Ok(EocdFixed {
            this_disk: read_u16(buf, 4),
            disk_with_cd: read_u16(buf, 6),
            entries_this_disk: read_u16(buf, 8),
            total_entries: read_u16(buf, 10),
            central_directory_size: read_u32(buf, 12),
            central_directory_offset: read_u32(buf, 16),
            comment_length: read_u16(buf, 20),
        })
    }

    pub fn with_tail(self, comment: Vec<u8>) -> EndOfCentralDirectoryRecord {
        EndOfCentralDirectoryRecord {
            this_disk: self.this_disk,
            disk_with_cd: self.disk_with_cd,
            entries_this_disk: self.entries_this_disk,
            total_entries: self.total_entries,
            central_directory_size: self.central_directory_size,
            central_directory_offset: self.central_directory_offset,
            comment,
        }
    }
}

impl EndOfCentralDirectoryRecord {
    pub fn encode_fixed(&self) -> [u8; EOCD_FIXED_SIZE] {
        let mut buf = Vec::with_capacity(EOCD_FIXED_SIZE);
        push_u32(&mut buf, EOCD_SIGNATURE);
        push_u16(&mut buf, self.this_disk);
        push_u16(&mut buf, self.disk_with_cd);
        push_u16(&mut buf, self.entries_this_disk);
        push_u16(&mut buf, self.total_entries);
        push_u32(&mut buf, self.central_directory_size);
        push_u32(&mut buf, self.central_directory_offset);
        push_u16(&mut buf, self.comment.len() as u16);
        buf.try_into().expect("fixed-size buffer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lfh_round_trips_fixed_prefix() {
        let h = LocalFileHeader {
            version_needed: 20,
            flags: 0,
            compression_method: 8,
            dos_datetime: 0x1234_5678,
            crc32: 0xDEAD_BEEF,
            compressed_size: 10,
            uncompressed_size: 20,
            name: b"a.txt".to_vec(),
            extra_field: vec![],
        };
        let encoded = h.encode_fixed();
        let fixed = LfhFixed::decode(&encoded, 0).unwrap();
        assert_eq!(fixed.name_length, 5);
        assert_eq!(fixed.crc32, 0xDEAD_BEEF);
        assert_eq!(fixed.compressed_size, 10);
    }

    #[test]
    fn lfh_rejects_bad_signature() {
        let mut buf = [0u8; LFH_FIXED_SIZE];
        buf[0] = 0xFF;
        let err = LfhFixed::decode(&buf, 42).unwrap_err();
        match err {
            ZipError::Structural { kind, offset } => {
                assert_eq!(kind, "LocalFileHeader");
                assert_eq!(offset, 42);
            }
            _ => panic!("expected structural error"),
        }
    }

    #[test]
    fn eocd_round_trips() {
        let e = EndOfCentralDirectoryRecord {
            this_disk: 0,
            disk_with_cd: 0,
            entries_this_disk: 2,
            total_entries: 2,
            central_directory_size: 100,
            central_directory_offset: 50,
            comment: b"hello".to_vec(),
        };
        let encoded = e.encode_fixed();
        let fixed = EocdFixed::decode(&encoded, 0).unwrap();
        assert_eq!(fixed.total_entries, 2);
        assert_eq!(fixed.comment_length, 5);
    }
}
