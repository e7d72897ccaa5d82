//! Shared wire-level constants (spec.md §4.1, §6.3).

use byteorder::{ByteOrder, LittleEndian};

use crate::error::ProtoError;
use crate::message::MessageType;

/// The receiver reads a bounded buffer and reinterprets the leading bytes;
/// no length prefix or framing exists. 4 KiB comfortably covers the
/// largest fixed request, `ZmqAddEndpoint` at ~160 bytes.
pub const STAGING_BUFFER_LEN: usize = 4096;

/// Peeks the `MessageType` tag without consuming or validating the rest
/// of the buffer — used by the connection handler to route to the right
/// decoder (spec.md §4.3 "Dispatch").
pub fn peek_message_type(buf: &[u8]) -> Result<MessageType, ProtoError> {
    if buf.len() < 4 {
        return Err(ProtoError::ShortRead { expected: 4, got: buf.len() });
    }
    MessageType::from_u32(LittleEndian::read_u32(&buf[0..4]))
}
