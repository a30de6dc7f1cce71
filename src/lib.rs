//! # zipkit: a classic-APPNOTE ZIP archive codec
//!
//! Reads and writes single-disk, unencrypted ZIP archives with STORE or
//! DEFLATE payloads. No ZIP64, no multi-disk spanning, no encryption —
//! see [`error::ZipError::Unsupported`] for what a given archive trips
//! over.
//!
//! ## Quick start
//!
//! ### Writing an archive
//!
//! ```no_run
//! use zipkit::{Archive, OpenSource};
//!
//! let mut archive = Archive::new();
//! archive.add_data("foobar/test.txt", b"TestData")?;
//!
//! let mut bytes = Vec::new();
//! archive.write_archive(&mut bytes)?;
//! # Ok::<(), zipkit::ZipError>(())
//! ```
//!
//! ### Reading an archive
//!
//! ```no_run
//! use zipkit::{Archive, OpenMode, OpenSource};
//! use std::path::PathBuf;
//!
//! let archive = Archive::open(OpenSource::Path(PathBuf::from("archive.zip")), OpenMode::ReadOnly)?;
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name_lossy(), entry.uncompressed_size());
//! }
//! # Ok::<(), zipkit::ZipError>(())
//! ```

pub mod archive;
pub mod crc;
pub mod deflate;
pub mod dostime;
pub mod entry;
pub mod error;
pub mod record;
pub mod sink;
pub mod source;

pub use archive::{Archive, OpenMode, OpenSource};
pub use entry::Entry;
pub use error::{Result, ZipError};
