//! `ErrorReply` (spec.md §3), embedded in most replies.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::ProtoError;
use crate::fixed_str::{decode_fixed, encode_fixed};

pub const DOMAIN_LEN: usize = 64;
pub const MESSAGE_LEN: usize = 512;

/// occurred(1) + domain(64) + code(4) + message(512)
pub const ERROR_REPLY_LEN: usize = 1 + DOMAIN_LEN + 4 + MESSAGE_LEN;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorReply {
    pub occurred: bool,
    pub domain: String,
    pub code: i32,
    pub message: String,
}

impl ErrorReply {
    pub const fn ok() -> Self {
        Self { occurred: false, domain: String::new(), code: 0, message: String::new() }
    }

    pub fn failed(domain: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self { occurred: true, domain: domain.into(), code, message: message.into() }
    }

    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), ERROR_REPLY_LEN);
        out.fill(0);
        out[0] = self.occurred as u8;
        encode_fixed(&mut out[1..1 + DOMAIN_LEN], &self.domain);
        LittleEndian::write_i32(&mut out[1 + DOMAIN_LEN..1 + DOMAIN_LEN + 4], self.code);
        encode_fixed(&mut out[1 + DOMAIN_LEN + 4..], &self.message);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), ERROR_REPLY_LEN);
        let occurred = buf[0] != 0;
        let domain = decode_fixed(&buf[1..1 + DOMAIN_LEN])?;
        let code = LittleEndian::read_i32(&buf[1 + DOMAIN_LEN..1 + DOMAIN_LEN + 4]);
        let message = decode_fixed(&buf[1 + DOMAIN_LEN + 4..])?;
        Ok(Self { occurred, domain, code, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ok_reply() {
        let e = ErrorReply::ok();
        let mut buf = vec![0u8; ERROR_REPLY_LEN];
        e.encode(&mut buf);
        assert_eq!(ErrorReply::decode(&buf).unwrap(), e);
    }

    #[test]
    fn round_trips_failed_reply() {
        let e = ErrorReply::failed("cam", 7, "dark");
        let mut buf = vec![0u8; ERROR_REPLY_LEN];
        e.encode(&mut buf);
        assert_eq!(ErrorReply::decode(&buf).unwrap(), e);
    }
}
