//! Raw DEFLATE (no zlib/gzip wrapper) for compression method 8, via
//! `flate2` — the crate the teacher's `reader.rs`/`writer.rs` already use
//! (`flate2::read::DeflateDecoder`, `flate2::write::DeflateEncoder`).
//!
//! Both directions run on the whole in-memory payload per call, matching
//! the original C++'s use of `boost::iostreams` filters over a single
//! `array_source`/`back_inserter` buffer.

use std::io::{self, Read, Write};

use flate2::write::DeflateEncoder;
use flate2::{read::DeflateDecoder, Compression};

/// Compresses `data` with raw DEFLATE at the given level.
pub fn deflate_raw(data: &[u8], level: Compression) -> io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), level);
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompresses a raw DEFLATE stream.
pub fn inflate_raw(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_data() {
        let data = b"the quick brown fox jumps over the lazy dog, repeatedly, repeatedly.";
        let compressed = deflate_raw(data, Compression::default()).unwrap();
        let decompressed = inflate_raw(&compressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn empty_input_round_trips() {
        let compressed = deflate_raw(b"", Compression::default()).unwrap();
        let decompressed = inflate_raw(&compressed).unwrap();
        assert!(decompressed.is_empty());
    }

    #[test]
    fn output_has_no_zlib_header() {
        let data = vec![0xABu8; 256];
        let compressed = deflate_raw(&data, Compression::default()).unwrap();
        // A zlib stream's first two bytes form a valid CMF/FLG header
        // (famously 0x78 0x9c at default level); raw deflate has no such
        // framing, so the first byte should not be 0x78.
        assert_ne!(compressed.first().copied(), Some(0x78));
    }
}
