//! In-memory representation of one archive member (spec.md §4.2): header
//! metadata, a lazily materialized compressed payload, and — for entries
//! read from an existing archive — a read-adapter pointing back at the
//! archive's byte source.

use std::cell::RefCell;
use std::io;
use std::sync::Arc;

use crate::crc;
use crate::deflate;
use crate::dostime::{self, DosDateTime};
use crate::error::{Result, ZipError};
use crate::record::LocalFileHeader;
use crate::sink::ByteSink;
use crate::source::{Anchor, ByteSource};

/// Either a pointer at bytes still sitting in the archive's byte source, or
/// a buffer already held in memory. Lazily promoted from `Origin` to
/// `Materialized` the first time `read_content`/`write_entry` needs bytes.
enum Payload {
    Origin { source: Arc<dyn ByteSource>, offset: u64 },
    Materialized(Vec<u8>),
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Origin { offset, .. } => {
                f.debug_struct("Payload::Origin").field("offset", offset).finish()
            }
            Payload::Materialized(buf) => {
                f.debug_struct("Payload::Materialized").field("len", &buf.len()).finish()
            }
        }
    }
}

/// One archive member. Shared via `Arc<Entry>` so a caller can hold a
/// reference past the call that returned it (Design Note 3, spec.md §9) —
/// the archive never needs exclusive access back once an entry exists.
#[derive(Debug)]
pub struct Entry {
    header: LocalFileHeader,
    payload: RefCell<Payload>,
}

impl Entry {
    /// Wraps an entry whose payload lives in the parent archive's byte
    /// source at `offset`, read lazily on first `read_content`/`write_entry`.
    pub(crate) fn from_origin(
        header: LocalFileHeader,
        source: Arc<dyn ByteSource>,
        offset: u64,
    ) -> Self {
        Entry { header, payload: RefCell::new(Payload::Origin { source, offset }) }
    }

    /// Wraps an entry whose (already-compressed) payload is held directly.
    pub(crate) fn from_materialized(header: LocalFileHeader, compressed: Vec<u8>) -> Self {
        Entry { header, payload: RefCell::new(Payload::Materialized(compressed)) }
    }

    /// Entry name exactly as stored. Bytes are preserved as-is; UTF-8 is
    /// not enforced.
    pub fn name(&self) -> &[u8] {
        &self.header.name
    }

    /// Entry name decoded lossily, for display purposes.
    pub fn name_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.header.name)
    }

    pub fn compression_method(&self) -> u16 {
        self.header.compression_method
    }

    pub fn compressed_size(&self) -> u64 {
        self.header.compressed_size as u64
    }

    pub fn uncompressed_size(&self) -> u64 {
        self.header.uncompressed_size as u64
    }

    pub fn crc32(&self) -> u32 {
        self.header.crc32
    }

    /// Always 0: encryption is out of scope for this codec.
    pub fn encryption_method(&self) -> u16 {
        0
    }

    pub fn is_directory(&self) -> bool {
        self.header.name.last() == Some(&b'/')
    }

    pub fn is_file(&self) -> bool {
        !self.is_directory()
    }

    pub fn modification_time(&self) -> DosDateTime {
        dostime::unpack(self.header.dos_datetime)
    }

    /// Returns the raw, still-compressed payload bytes, materializing from
    /// the origin byte source first if needed. Useful for tooling that
    /// wants to inspect the compressed stream directly rather than go
    /// through `read_content`'s decompress-then-verify path.
    pub fn compressed_payload(&self) -> Result<Vec<u8>> {
        self.materialize()?;
        let payload = self.payload.borrow();
        match &*payload {
            Payload::Materialized(buf) => Ok(buf.clone()),
            Payload::Origin { .. } => unreachable!("materialize() always resolves to Materialized"),
        }
    }

    /// Writes the decompressed payload to `sink`, returning the number of
    /// bytes written. Verifies the CRC-32 of the decompressed bytes against
    /// the header's recorded checksum before treating the result as valid.
    pub fn read_content<W: io::Write>(&self, sink: &mut W) -> Result<u64> {
        self.materialize()?;
        let payload = self.payload.borrow();
        let compressed: &[u8] = match &*payload {
            Payload::Materialized(buf) => buf,
            Payload::Origin { .. } => unreachable!("materialize() always resolves to Materialized"),
        };

        let decompressed = match self.header.compression_method {
            0 => compressed.to_vec(),
            8 => deflate::inflate_raw(compressed)?,
            other => {
                return Err(ZipError::Unsupported(format!("compression method {other}")))
            }
        };

        let actual_crc32 = crc::crc32(&decompressed);
        if actual_crc32 != self.header.crc32 {
            return Err(ZipError::Corruption {
                expected_crc32: self.header.crc32,
                actual_crc32,
            });
        }

        sink.write_all(&decompressed)?;
        Ok(decompressed.len() as u64)
    }

    /// Emits the LFH fixed prefix, name, extra field, and compressed
    /// payload (in that order), returning the total bytes written.
    pub fn write_entry<S: ByteSink>(&self, sink: &mut S) -> Result<u64> {
        self.materialize()?;
        let header_bytes = self.header.encode_fixed();
        sink.write_all(&header_bytes)?;
        sink.write_all(&self.header.name)?;
        sink.write_all(&self.header.extra_field)?;

        let payload = self.payload.borrow();
        let compressed: &[u8] = match &*payload {
            Payload::Materialized(buf) => buf,
            Payload::Origin { .. } => unreachable!("materialize() always resolves to Materialized"),
        };
        sink.write_all(compressed)?;

        Ok(header_bytes.len() as u64
            + self.header.name.len() as u64
            + self.header.extra_field.len() as u64
            + compressed.len() as u64)
    }

    /// Pulls the compressed bytes out of the origin byte source, if they
    /// haven't been already. A short read is fatal, per §4.2 step 1.
    fn materialize(&self) -> Result<()> {
        let needs_load = matches!(&*self.payload.borrow(), Payload::Origin { .. });
        if !needs_load {
            return Ok(());
        }
        let (source, offset) = match &*self.payload.borrow() {
            Payload::Origin { source, offset } => (Arc::clone(source), *offset),
            Payload::Materialized(_) => unreachable!(),
        };
        let mut buf = vec![0u8; self.header.compressed_size as usize];
        if !buf.is_empty() {
            let n = source.read_at(offset as i64, Anchor::Begin, &mut buf)?;
            if n != buf.len() {
                return Err(ZipError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "short read on entry payload",
                )));
            }
        }
        *self.payload.borrow_mut() = Payload::Materialized(buf);
        Ok(())
    }
}

/// Builds the `LocalFileHeader` + materialized compressed payload for a
/// freshly ingested entry. Non-empty data is compressed with raw DEFLATE;
/// empty/directory data is stored with method 0, matching the original's
/// `newEntry` (a null/empty buffer gets compression method 0).
pub(crate) fn build_header_and_payload(
    name: &[u8],
    data: &[u8],
    dos_datetime: u32,
    level: flate2::Compression,
) -> Result<(LocalFileHeader, Vec<u8>)> {
    let crc32 = crc::crc32(data);
    let (compression_method, compressed) = if data.is_empty() {
        (0u16, Vec::new())
    } else {
        (8u16, deflate::deflate_raw(data, level)?)
    };
    let header = LocalFileHeader {
        version_needed: 20,
        flags: 0,
        compression_method,
        dos_datetime,
        crc32,
        compressed_size: compressed.len() as u32,
        uncompressed_size: data.len() as u32,
        name: name.to_vec(),
        extra_field: Vec::new(),
    };
    Ok((header, compressed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    #[test]
    fn directory_entries_have_zero_metadata() {
        let (header, payload) =
            build_header_and_payload(b"dir/", b"", 0, flate2::Compression::default()).unwrap();
        assert_eq!(header.compression_method, 0);
        assert_eq!(header.crc32, 0);
        assert_eq!(header.uncompressed_size, 0);
        assert!(payload.is_empty());
        let entry = Entry::from_materialized(header, payload);
        assert!(entry.is_directory());
        assert!(!entry.is_file());
    }

    #[test]
    fn read_content_round_trips_materialized_payload() {
        let (header, payload) =
            build_header_and_payload(b"a.txt", b"TestData", 0, flate2::Compression::default())
                .unwrap();
        let entry = Entry::from_materialized(header, payload);
        let mut out = Vec::new();
        let n = entry.read_content(&mut out).unwrap();
        assert_eq!(n, 8);
        assert_eq!(out, b"TestData");
    }

    #[test]
    fn read_content_detects_crc_corruption() {
        let (header, mut payload) =
            build_header_and_payload(b"a.txt", b"TestData", 0, flate2::Compression::default())
                .unwrap();
        // Flip a bit inside the compressed payload.
        let idx = payload.len() / 2;
        payload[idx] ^= 0x01;
        let entry = Entry::from_materialized(header, payload);
        let mut out = Vec::new();
        let err = entry.read_content(&mut out).unwrap_err();
        assert!(matches!(err, ZipError::Corruption { .. }));
    }

    #[test]
    fn read_content_lazily_loads_from_origin() {
        let (header, payload) =
            build_header_and_payload(b"a.txt", b"TestData", 0, flate2::Compression::default())
                .unwrap();
        let mut backing = vec![0u8; 4];
        backing.extend_from_slice(&payload);
        let source: Arc<dyn ByteSource> = Arc::new(MemorySource::new(backing));
        let entry = Entry::from_origin(header, source, 4);
        let mut out = Vec::new();
        entry.read_content(&mut out).unwrap();
        assert_eq!(out, b"TestData");
    }

    #[test]
    fn unsupported_method_rejected() {
        let (mut header, payload) =
            build_header_and_payload(b"a.txt", b"TestData", 0, flate2::Compression::default())
                .unwrap();
        header.compression_method = 99;
        let entry = Entry::from_materialized(header, payload);
        let mut out = Vec::new();
        let err = entry.read_content(&mut out).unwrap_err();
        assert!(matches!(err, ZipError::Unsupported(_)));
    }
}
