//! Byte-sink capability: the write side of the external interface in
//! spec.md §6 — sequential append plus a running logical byte count, so
//! `Archive::write_archive` can record offsets as it emits records.
//! Grounded on the teacher's `CrcCountingWriter` in `writer.rs`, which
//! wraps an arbitrary `Write` to track bytes written alongside a CRC.

use std::io::{self, Write};

pub trait ByteSink {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
    /// Current logical byte count — the offset the next write will land at.
    fn position(&self) -> u64;
}

impl ByteSink for Vec<u8> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.len() as u64
    }
}

/// Adapts any `std::io::Write` (a `File`, a `BufWriter`, ...) into a
/// `ByteSink` by counting the bytes that pass through it.
pub struct CountingWriter<W: Write> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteSink for CountingWriter<W> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)?;
        self.count += buf.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.count
    }
}
