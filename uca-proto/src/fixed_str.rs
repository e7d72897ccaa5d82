//! Zero-padded fixed-width UTF-8 string fields (spec.md §3, §6.3).
//!
//! Every fixed-width field on the wire is exactly `N` bytes, zero-padded.
//! Encoding truncates at the last UTF-8 boundary that fits rather than
//! splitting a multi-byte code point; decoding stops at the first NUL.

use crate::error::ProtoError;

/// Writes `s` into `out[..N]`, zero-padding the remainder. `out` must be
/// exactly `N` bytes long.
pub fn encode_fixed(out: &mut [u8], s: &str) {
    let n = out.len();
    out.fill(0);
    let bytes = s.as_bytes();
    if bytes.len() <= n {
        out[..bytes.len()].copy_from_slice(bytes);
        return;
    }
    // Truncate without splitting a UTF-8 code point.
    let mut cut = n;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    out[..cut].copy_from_slice(&bytes[..cut]);
}

/// Reads a NUL-terminated (or full-width) UTF-8 string out of `buf`.
pub fn decode_fixed(buf: &[u8]) -> Result<String, ProtoError> {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    std::str::from_utf8(&buf[..end])
        .map(|s| s.to_string())
        .map_err(|_| ProtoError::Utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_short_string() {
        let mut buf = [0u8; 16];
        encode_fixed(&mut buf, "exposure-time");
        assert_eq!(decode_fixed(&buf).unwrap(), "exposure-time");
    }

    #[test]
    fn zero_pads_remainder() {
        let mut buf = [0xAAu8; 8];
        encode_fixed(&mut buf, "ab");
        assert_eq!(&buf, &[b'a', b'b', 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn truncates_on_overflow_without_splitting_utf8() {
        let mut buf = [0u8; 3];
        encode_fixed(&mut buf, "héllo"); // 'é' is 2 bytes, would split at index 2
        let decoded = decode_fixed(&buf).unwrap();
        assert!(decoded.is_char_boundary(decoded.len()));
        assert!(std::str::from_utf8(&buf).is_ok());
    }
}
