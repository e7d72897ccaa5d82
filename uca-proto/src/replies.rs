//! Reply structs (spec.md §4.1, §4.3, §7).

use byteorder::{ByteOrder, LittleEndian};

use crate::descriptor::NAME_LEN;
use crate::error::ProtoError;
use crate::error_reply::{ErrorReply, ERROR_REPLY_LEN};
use crate::fixed_str::{decode_fixed, encode_fixed};
use crate::message::MessageType;

const TAG_LEN: usize = 4;

fn read_tag(buf: &[u8]) -> Result<MessageType, ProtoError> {
    MessageType::from_u32(LittleEndian::read_u32(&buf[0..4]))
}

/// The reply shape for every handler whose only output is success/failure:
/// `Start/StopRecording`, `Start/StopReadout`, `Trigger`, `SetProperty`,
/// `Grab` (precedes the raw frame bytes), `Write`, `Push` (sent when the
/// stream ends), `ZmqAddEndpoint`/`ZmqRemoveEndpoint`, `StopPush`.
pub const DEFAULT_REPLY_LEN: usize = TAG_LEN + ERROR_REPLY_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultReply {
    pub msg_type: MessageType,
    pub error: ErrorReply,
}

impl DefaultReply {
    pub fn ok(msg_type: MessageType) -> Self {
        Self { msg_type, error: ErrorReply::ok() }
    }

    pub fn failed(msg_type: MessageType, error: ErrorReply) -> Self {
        Self { msg_type, error }
    }

    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), DEFAULT_REPLY_LEN);
        LittleEndian::write_u32(&mut out[0..4], self.msg_type.as_u32());
        self.error.encode(&mut out[TAG_LEN..]);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), DEFAULT_REPLY_LEN);
        Ok(Self {
            msg_type: read_tag(buf)?,
            error: ErrorReply::decode(&buf[TAG_LEN..])?,
        })
    }
}

/// `GetProperty` reply: `{ msg_type, error, property_value }` — the error
/// field is an addition over the table in spec.md §4.3 for consistency
/// with §7's "handlers never throw across the connection boundary" rule;
/// see DESIGN.md.
pub const GET_PROPERTY_REPLY_LEN: usize = TAG_LEN + ERROR_REPLY_LEN + NAME_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetPropertyReply {
    pub error: ErrorReply,
    pub property_value: String,
}

impl GetPropertyReply {
    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), GET_PROPERTY_REPLY_LEN);
        LittleEndian::write_u32(&mut out[0..4], MessageType::GetProperty.as_u32());
        self.error.encode(&mut out[TAG_LEN..TAG_LEN + ERROR_REPLY_LEN]);
        encode_fixed(&mut out[TAG_LEN + ERROR_REPLY_LEN..], &self.property_value);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), GET_PROPERTY_REPLY_LEN);
        Ok(Self {
            error: ErrorReply::decode(&buf[TAG_LEN..TAG_LEN + ERROR_REPLY_LEN])?,
            property_value: decode_fixed(&buf[TAG_LEN + ERROR_REPLY_LEN..])?,
        })
    }
}

/// `GetProperties` reply header: `{ msg_type, count }`, followed by
/// `count` `PropertyDescriptor` records read back-to-back (spec.md §4.2).
pub const GET_PROPERTIES_REPLY_LEN: usize = TAG_LEN + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetPropertiesReply {
    pub count: u32,
}

impl GetPropertiesReply {
    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), GET_PROPERTIES_REPLY_LEN);
        LittleEndian::write_u32(&mut out[0..4], MessageType::GetProperties.as_u32());
        LittleEndian::write_u32(&mut out[TAG_LEN..], self.count);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), GET_PROPERTIES_REPLY_LEN);
        let msg_type = read_tag(buf)?;
        if msg_type != MessageType::GetProperties {
            return Err(ProtoError::TypeMismatch { expected: MessageType::GetProperties, got: msg_type });
        }
        Ok(Self { count: LittleEndian::read_u32(&buf[TAG_LEN..]) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ok_default_reply() {
        let r = DefaultReply::ok(MessageType::Trigger);
        let mut buf = vec![0u8; DEFAULT_REPLY_LEN];
        r.encode(&mut buf);
        assert_eq!(DefaultReply::decode(&buf).unwrap(), r);
    }

    #[test]
    fn round_trips_failed_default_reply() {
        let r = DefaultReply::failed(MessageType::Grab, ErrorReply::failed("cam", 7, "dark"));
        let mut buf = vec![0u8; DEFAULT_REPLY_LEN];
        r.encode(&mut buf);
        assert_eq!(DefaultReply::decode(&buf).unwrap(), r);
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut buf = vec![0u8; GET_PROPERTIES_REPLY_LEN];
        GetPropertiesReply { count: 3 }.encode(&mut buf);
        LittleEndian::write_u32(&mut buf[0..4], MessageType::Grab.as_u32());
        assert!(matches!(
            GetPropertiesReply::decode(&buf),
            Err(ProtoError::TypeMismatch { .. })
        ));
    }
}
