//! The top-level archive handle (spec.md §4.3). On open (read mode):
//! locates the EOCD by backward scan, parses the central directory, and
//! materializes one `Entry` per central directory file header. On build
//! (write mode): accepts new entries via `add_data`, compressing on
//! ingest, and on `write_archive` emits the LFH+payload stream, central
//! directory, and EOCD with fixed-up offsets.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::Compression;

use crate::dostime::{self, DosDateTime};
use crate::entry::{self, Entry};
use crate::error::{Result, ZipError};
use crate::record::{
    CdfhFixed, CentralDirectoryFileHeader, EndOfCentralDirectoryRecord, EocdFixed, LfhFixed,
    CDFH_FIXED_SIZE, EOCD_FIXED_SIZE,
};
use crate::sink::ByteSink;
use crate::source::{Anchor, ByteSource, FileSource, MemorySource};

/// The mode an archive is opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Parse an existing archive; no mutation is attempted.
    ReadOnly,
    /// Parse an existing archive and allow further `add_data` calls.
    Write,
    /// Start empty; no parse.
    New,
}

/// Where to read an archive from when opening it.
pub enum OpenSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

/// The original source's `newEntry` stamps every freshly-added entry with
/// this fixed timestamp rather than the wall clock, which is what makes
/// `writeArchive` output byte-for-byte deterministic across runs (the
/// idempotence property in spec.md §8 requires "deterministic DOS datetime
/// input"). We keep that behavior rather than reading `SystemTime::now()`.
fn default_dos_datetime() -> u32 {
    dostime::pack(DosDateTime { year: 2020, month: 3, day: 26, hour: 16, minute: 31, second: 10 })
}

pub struct Archive {
    path: Option<PathBuf>,
    source: Option<Arc<dyn ByteSource>>,
    mode: OpenMode,
    eocd: EndOfCentralDirectoryRecord,
    directory: Vec<CentralDirectoryFileHeader>,
    entries: Vec<Arc<Entry>>,
    compression_level: Compression,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Archive {
    /// Starts a brand-new, empty, in-memory archive (`OpenMode::New`).
    pub fn new() -> Archive {
        Self::empty(None)
    }

    /// Opens an archive per spec.md §4.3. `ReadOnly`/`Write` parse an
    /// existing source; `New` starts empty regardless of source contents.
    pub fn open(source: OpenSource, mode: OpenMode) -> Result<Archive> {
        match source {
            OpenSource::Path(path) => Self::open_path(path, mode),
            OpenSource::Memory(data) => Self::open_memory(data, mode),
        }
    }

    pub fn open_path<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Archive> {
        let path_buf = path.as_ref().to_path_buf();
        if mode == OpenMode::New {
            return Ok(Self::empty(Some(path_buf)));
        }
        let source: Arc<dyn ByteSource> = Arc::new(FileSource::open(&path_buf)?);
        let (eocd, directory, entries) = parse(&source)?;
        Ok(Archive {
            path: Some(path_buf),
            source: Some(source),
            mode,
            eocd,
            directory,
            entries,
            compression_level: Compression::default(),
        })
    }

    /// In-memory sources may not be opened in `Write` mode (spec.md §4.3).
    pub fn open_memory(data: Vec<u8>, mode: OpenMode) -> Result<Archive> {
        if mode == OpenMode::Write {
            return Err(ZipError::Unsupported(
                "an in-memory archive cannot be opened in Write mode".into(),
            ));
        }
        if mode == OpenMode::New {
            return Ok(Self::empty(None));
        }
        let source: Arc<dyn ByteSource> = Arc::new(MemorySource::new(data));
        let (eocd, directory, entries) = parse(&source)?;
        Ok(Archive {
            path: None,
            source: Some(source),
            mode,
            eocd,
            directory,
            entries,
            compression_level: Compression::default(),
        })
    }

    pub fn with_compression_level(mut self, level: Compression) -> Archive {
        self.compression_level = level;
        self
    }

    fn empty(path: Option<PathBuf>) -> Archive {
        Archive {
            path,
            source: None,
            mode: OpenMode::New,
            eocd: EndOfCentralDirectoryRecord {
                this_disk: 0,
                disk_with_cd: 0,
                entries_this_disk: 0,
                total_entries: 0,
                central_directory_size: 0,
                central_directory_offset: 0,
                comment: Vec::new(),
            },
            directory: Vec::new(),
            entries: Vec::new(),
            compression_level: Compression::default(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn set_comment(&mut self, comment: impl Into<Vec<u8>>) {
        self.eocd.comment = comment.into();
    }

    pub fn comment(&self) -> &[u8] {
        &self.eocd.comment
    }

    pub fn number_of_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Arc<Entry>] {
        &self.entries
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name() == name.as_bytes())
    }

    pub fn get_entry(&self, name: &str) -> Option<Arc<Entry>> {
        self.entries.iter().find(|e| e.name() == name.as_bytes()).cloned()
    }

    /// Inserts one entry, synthesizing directory entries for every
    /// intermediate path segment not already present (spec.md §4.3). Fails
    /// without any side effect if `name` is an absolute path.
    pub fn add_data(&mut self, name: &str, data: &[u8]) -> Result<()> {
        if name.starts_with('/') {
            return Err(ZipError::InvalidArgument(format!(
                "absolute entry names are not allowed: {name}"
            )));
        }
        let parts: Vec<&str> = name.split('/').filter(|s| !s.is_empty()).collect();
        if parts.is_empty() {
            return Err(ZipError::InvalidArgument("entry name must not be empty".into()));
        }

        let mut cumulative = String::new();
        for part in &parts[..parts.len() - 1] {
            cumulative.push_str(part);
            cumulative.push('/');
            if !self.has_entry(&cumulative) {
                self.push_entry(cumulative.as_bytes(), &[])?;
                log::debug!("synthesized directory entry {cumulative:?}");
            }
        }

        let final_name = if name.ends_with('/') {
            cumulative
        } else {
            format!("{cumulative}{}", parts[parts.len() - 1])
        };
        self.push_entry(final_name.as_bytes(), data)
    }

    fn push_entry(&mut self, name: &[u8], data: &[u8]) -> Result<()> {
        let dos_datetime = default_dos_datetime();
        let (header, compressed) =
            entry::build_header_and_payload(name, data, dos_datetime, self.compression_level)?;
        let cdfh = CentralDirectoryFileHeader {
            version_made_by: 20,
            version_needed: header.version_needed,
            flags: header.flags,
            compression_method: header.compression_method,
            dos_datetime: header.dos_datetime,
            crc32: header.crc32,
            compressed_size: header.compressed_size,
            uncompressed_size: header.uncompressed_size,
            disk_start: 0,
            internal_attrs: 0,
            external_attrs: 0,
            offset_of_local_header: 0,
            name: name.to_vec(),
            extra_field: Vec::new(),
            comment: Vec::new(),
        };
        self.entries.push(Arc::new(Entry::from_materialized(header, compressed)));
        self.directory.push(cdfh);
        self.eocd.total_entries += 1;
        self.eocd.entries_this_disk += 1;
        Ok(())
    }

    /// `renameEntry`/`addFile`/`addEntry` are declared-but-unsupported in
    /// the original source (spec.md §9's Open Questions); they return an
    /// error rather than mutating anything.
    pub fn rename_entry(&self, _entry: &str, _new_name: &str) -> Result<()> {
        Err(ZipError::Unsupported("rename_entry is not implemented".into()))
    }

    pub fn add_file(&self, _entry_name: &str, _file: &Path) -> Result<()> {
        Err(ZipError::Unsupported("add_file is not implemented".into()))
    }

    pub fn add_entry(&self, _entry_name: &str) -> Result<()> {
        Err(ZipError::Unsupported("add_entry is not implemented".into()))
    }

    /// Emits entries, central directory, and EOCD to `sink`, backpatching
    /// each central directory record's local-header offset once the
    /// matching local header has actually been written (spec.md §4.3).
    /// Returns the total number of bytes written.
    pub fn write_archive<S: ByteSink>(&self, sink: &mut S) -> Result<u64> {
        let start = sink.position();
        let mut local_offsets = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            local_offsets.push(sink.position());
            entry.write_entry(sink)?;
        }

        let cd_start = sink.position();
        for (cdfh, local_offset) in self.directory.iter().zip(local_offsets.iter()) {
            let mut cdfh = cdfh.clone();
            cdfh.offset_of_local_header = *local_offset as u32;
            sink.write_all(&cdfh.encode_fixed())?;
            sink.write_all(&cdfh.name)?;
            sink.write_all(&cdfh.extra_field)?;
            sink.write_all(&cdfh.comment)?;
        }
        let cd_size = sink.position() - cd_start;

        let mut eocd = self.eocd.clone();
        eocd.central_directory_offset = cd_start as u32;
        eocd.central_directory_size = cd_size as u32;
        sink.write_all(&eocd.encode_fixed())?;
        sink.write_all(&eocd.comment)?;

        log::debug!(
            "wrote archive: {} entries, central directory {} bytes at {}",
            self.entries.len(),
            cd_size,
            cd_start
        );
        Ok(sink.position() - start)
    }
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}

fn read_exact_at(
    source: &dyn ByteSource,
    offset: i64,
    anchor: Anchor,
    len: usize,
) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    if len > 0 {
        let n = source.read_at(offset, anchor, &mut buf)?;
        if n != len {
            return Err(ZipError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "short read",
            )));
        }
    }
    Ok(buf)
}

/// Locates the End-of-Central-Directory Record by scanning backward from
/// end-of-file one byte at a time, per spec.md §4.3's key algorithm. Tries
/// the shortest possible comment first (0 bytes), then 1, 2, ... — the
/// first signature match wins and its declared comment length must then
/// account for exactly the scanned distance, or the record is structurally
/// inconsistent.
fn find_eocd(source: &dyn ByteSource) -> Result<EndOfCentralDirectoryRecord> {
    let mut trailing_comment_len: i64 = 0;
    loop {
        let mut window = [0u8; EOCD_FIXED_SIZE];
        let window_offset = -(EOCD_FIXED_SIZE as i64 + trailing_comment_len);
        let n = match source.read_at(window_offset, Anchor::End, &mut window) {
            Ok(n) => n,
            Err(_) => break,
        };
        if n < EOCD_FIXED_SIZE {
            break;
        }
        if window[0..4] == crate::record::EOCD_SIGNATURE.to_le_bytes() {
            let fixed = EocdFixed::decode(&window, 0)?;
            if fixed.comment_length as i64 != trailing_comment_len {
                return Err(ZipError::Structural {
                    kind: "EndOfCentralDirectoryRecord",
                    offset: 0,
                });
            }
            let comment = read_exact_at(
                source,
                -(fixed.comment_length as i64),
                Anchor::End,
                fixed.comment_length as usize,
            )?;
            return Ok(fixed.with_tail(comment));
        }
        trailing_comment_len += 1;
    }
    Err(ZipError::Structural { kind: "EndOfCentralDirectoryRecord", offset: 0 })
}

fn parse_central_directory(
    source: &dyn ByteSource,
    eocd: &EndOfCentralDirectoryRecord,
) -> Result<Vec<CentralDirectoryFileHeader>> {
    let cd_bytes = read_exact_at(
        source,
        eocd.central_directory_offset as i64,
        Anchor::Begin,
        eocd.central_directory_size as usize,
    )?;

    let mut directory = Vec::with_capacity(eocd.total_entries as usize);
    let mut pos = 0usize;
    for _ in 0..eocd.total_entries {
        if pos + CDFH_FIXED_SIZE > cd_bytes.len() {
            return Err(ZipError::Structural {
                kind: "CentralDirectoryFileHeader",
                offset: eocd.central_directory_offset as u64 + pos as u64,
            });
        }
        let record_offset = eocd.central_directory_offset as u64 + pos as u64;
        let fixed = CdfhFixed::decode(&cd_bytes[pos..pos + CDFH_FIXED_SIZE], record_offset)?;
        pos += CDFH_FIXED_SIZE;
        if fixed.disk_start != 0 {
            return Err(ZipError::Unsupported("multi-disk archives are not supported".into()));
        }

        let name_len = fixed.name_length as usize;
        let extra_len = fixed.extra_field_length as usize;
        let comment_len = fixed.comment_length as usize;
        if pos + name_len + extra_len + comment_len > cd_bytes.len() {
            return Err(ZipError::Structural {
                kind: "CentralDirectoryFileHeader",
                offset: record_offset,
            });
        }
        let name = cd_bytes[pos..pos + name_len].to_vec();
        pos += name_len;
        let extra_field = cd_bytes[pos..pos + extra_len].to_vec();
        pos += extra_len;
        let comment = cd_bytes[pos..pos + comment_len].to_vec();
        pos += comment_len;

        directory.push(fixed.with_tail(name, extra_field, comment));
    }
    if pos != cd_bytes.len() {
        return Err(ZipError::Structural {
            kind: "CentralDirectoryFileHeader",
            offset: eocd.central_directory_offset as u64 + pos as u64,
        });
    }
    Ok(directory)
}

fn load_entries(
    source: &Arc<dyn ByteSource>,
    directory: &[CentralDirectoryFileHeader],
) -> Result<Vec<Arc<Entry>>> {
    let mut entries = Vec::with_capacity(directory.len());
    for cdfh in directory {
        let lfh_bytes = read_exact_at(
            source.as_ref(),
            cdfh.offset_of_local_header as i64,
            Anchor::Begin,
            crate::record::LFH_FIXED_SIZE,
        )?;
        let lfh_fixed =
            LfhFixed::decode(&lfh_bytes, cdfh.offset_of_local_header as u64)?;
        let name = read_exact_at(source.as_ref(), 0, Anchor::Current, lfh_fixed.name_length as usize)?;
        let extra_field =
            read_exact_at(source.as_ref(), 0, Anchor::Current, lfh_fixed.extra_field_length as usize)?;
        let data_offset = cdfh.offset_of_local_header as u64
            + crate::record::LFH_FIXED_SIZE as u64
            + name.len() as u64
            + extra_field.len() as u64;
        let header = lfh_fixed.with_tail(name, extra_field);
        entries.push(Arc::new(Entry::from_origin(header, Arc::clone(source), data_offset)));
    }
    Ok(entries)
}

fn parse(
    source: &Arc<dyn ByteSource>,
) -> Result<(EndOfCentralDirectoryRecord, Vec<CentralDirectoryFileHeader>, Vec<Arc<Entry>>)> {
    let eocd = find_eocd(source.as_ref())?;
    if eocd.this_disk != 0 || eocd.disk_with_cd != 0 {
        return Err(ZipError::Unsupported("multi-disk archives are not supported".into()));
    }
    if eocd.total_entries != eocd.entries_this_disk {
        return Err(ZipError::Structural { kind: "EndOfCentralDirectoryRecord", offset: 0 });
    }
    log::debug!(
        "located EOCD: {} entries, central directory {} bytes at offset {}",
        eocd.total_entries,
        eocd.central_directory_size,
        eocd.central_directory_offset
    );
    let directory = parse_central_directory(source.as_ref(), &eocd)?;
    if directory.len() != eocd.total_entries as usize {
        return Err(ZipError::Structural { kind: "EndOfCentralDirectoryRecord", offset: 0 });
    }
    let entries = load_entries(source, &directory)?;
    log::debug!("parsed {} central directory entries", directory.len());
    Ok((eocd, directory, entries))
}
