//! CRC-32 (IEEE 802.3) over archive payloads, via `crc32fast` — the same
//! crate the teacher's `writer.rs` uses in `CrcCountingWriter`.

/// Computes the IEEE CRC-32 of `data` (poly 0xEDB88320, init 0xFFFFFFFF,
/// final XOR 0xFFFFFFFF), matching the checksum PKWARE stores in the
/// local/central file headers.
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Incremental CRC-32 accumulator for callers that want to feed bytes as
/// they arrive rather than hashing one contiguous slice.
#[derive(Default)]
pub struct Crc32Writer(crc32fast::Hasher);

impl Crc32Writer {
    pub fn new() -> Self {
        Self(crc32fast::Hasher::new())
    }

    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    pub fn finalize(self) -> u32 {
        self.0.finalize()
    }
}
