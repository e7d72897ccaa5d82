//! Request structs (spec.md §4.1, §4.3). Every struct begins with its
//! `MessageType` tag; offsets of every field are frozen constants.

use byteorder::{ByteOrder, LittleEndian};

use crate::descriptor::NAME_LEN;
use crate::error::ProtoError;
use crate::fixed_str::{decode_fixed, encode_fixed};
use crate::message::MessageType;

const TAG_LEN: usize = 4;

fn read_tag(buf: &[u8]) -> Result<MessageType, ProtoError> {
    MessageType::from_u32(LittleEndian::read_u32(&buf[0..4]))
}

/// A request carrying no payload beyond its tag: `GetProperties`,
/// `StartRecording`, `StopRecording`, `StartReadout`, `StopReadout`,
/// `Trigger`, `StopPush`, `CloseConnection`.
pub const HEADER_ONLY_LEN: usize = TAG_LEN;

pub fn encode_header_only(msg_type: MessageType, out: &mut [u8]) {
    debug_assert_eq!(out.len(), HEADER_ONLY_LEN);
    LittleEndian::write_u32(&mut out[0..4], msg_type.as_u32());
}

pub fn decode_header_only(buf: &[u8]) -> Result<MessageType, ProtoError> {
    read_tag(buf)
}

/// `GetProperty { name }`.
pub const GET_PROPERTY_LEN: usize = TAG_LEN + NAME_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetPropertyRequest {
    pub name: String,
}

impl GetPropertyRequest {
    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), GET_PROPERTY_LEN);
        LittleEndian::write_u32(&mut out[0..4], MessageType::GetProperty.as_u32());
        encode_fixed(&mut out[TAG_LEN..], &self.name);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), GET_PROPERTY_LEN);
        Ok(Self { name: decode_fixed(&buf[TAG_LEN..])? })
    }
}

/// `SetProperty { name, value }`. Value is always transported as text
/// (spec.md §4.3 "Property value stringification").
pub const SET_PROPERTY_LEN: usize = TAG_LEN + NAME_LEN + NAME_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPropertyRequest {
    pub name: String,
    pub value: String,
}

impl SetPropertyRequest {
    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), SET_PROPERTY_LEN);
        LittleEndian::write_u32(&mut out[0..4], MessageType::SetProperty.as_u32());
        encode_fixed(&mut out[TAG_LEN..TAG_LEN + NAME_LEN], &self.name);
        encode_fixed(&mut out[TAG_LEN + NAME_LEN..], &self.value);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), SET_PROPERTY_LEN);
        Ok(Self {
            name: decode_fixed(&buf[TAG_LEN..TAG_LEN + NAME_LEN])?,
            value: decode_fixed(&buf[TAG_LEN + NAME_LEN..])?,
        })
    }
}

/// `Grab { size }` — size in bytes of the frame the client expects back.
pub const GRAB_LEN: usize = TAG_LEN + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabRequest {
    pub size: u32,
}

impl GrabRequest {
    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), GRAB_LEN);
        LittleEndian::write_u32(&mut out[0..4], MessageType::Grab.as_u32());
        LittleEndian::write_u32(&mut out[TAG_LEN..], self.size);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), GRAB_LEN);
        Ok(Self { size: LittleEndian::read_u32(&buf[TAG_LEN..]) })
    }
}

/// `Write { name, size } followed by `size` raw bytes on the connection.
pub const WRITE_LEN: usize = TAG_LEN + NAME_LEN + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub name: String,
    pub size: u32,
}

impl WriteRequest {
    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), WRITE_LEN);
        LittleEndian::write_u32(&mut out[0..4], MessageType::Write.as_u32());
        encode_fixed(&mut out[TAG_LEN..TAG_LEN + NAME_LEN], &self.name);
        LittleEndian::write_u32(&mut out[TAG_LEN + NAME_LEN..], self.size);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), WRITE_LEN);
        Ok(Self {
            name: decode_fixed(&buf[TAG_LEN..TAG_LEN + NAME_LEN])?,
            size: LittleEndian::read_u32(&buf[TAG_LEN + NAME_LEN..]),
        })
    }
}

/// `Push { num_frames }`. A negative count means "until `StopPush`".
pub const PUSH_LEN: usize = TAG_LEN + 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushRequest {
    pub num_frames: i64,
}

impl PushRequest {
    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), PUSH_LEN);
        LittleEndian::write_u32(&mut out[0..4], MessageType::Push.as_u32());
        LittleEndian::write_i64(&mut out[TAG_LEN..], self.num_frames);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), PUSH_LEN);
        Ok(Self { num_frames: LittleEndian::read_i64(&buf[TAG_LEN..]) })
    }
}

/// `ZmqAddEndpoint { endpoint, socket_type, high_water_mark }`. The
/// largest fixed request struct (~160 bytes, per spec.md §4.1).
pub const ZMQ_ADD_ENDPOINT_LEN: usize = TAG_LEN + NAME_LEN + 4 + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZmqAddEndpointRequest {
    pub endpoint: String,
    pub socket_type: u32,
    pub high_water_mark: u32,
}

impl ZmqAddEndpointRequest {
    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), ZMQ_ADD_ENDPOINT_LEN);
        LittleEndian::write_u32(&mut out[0..4], MessageType::ZmqAddEndpoint.as_u32());
        encode_fixed(&mut out[TAG_LEN..TAG_LEN + NAME_LEN], &self.endpoint);
        let mut off = TAG_LEN + NAME_LEN;
        LittleEndian::write_u32(&mut out[off..off + 4], self.socket_type);
        off += 4;
        LittleEndian::write_u32(&mut out[off..off + 4], self.high_water_mark);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), ZMQ_ADD_ENDPOINT_LEN);
        let endpoint = decode_fixed(&buf[TAG_LEN..TAG_LEN + NAME_LEN])?;
        let mut off = TAG_LEN + NAME_LEN;
        let socket_type = LittleEndian::read_u32(&buf[off..off + 4]);
        off += 4;
        let high_water_mark = LittleEndian::read_u32(&buf[off..off + 4]);
        Ok(Self { endpoint, socket_type, high_water_mark })
    }
}

/// `ZmqRemoveEndpoint { endpoint }`.
pub const ZMQ_REMOVE_ENDPOINT_LEN: usize = TAG_LEN + NAME_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZmqRemoveEndpointRequest {
    pub endpoint: String,
}

impl ZmqRemoveEndpointRequest {
    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), ZMQ_REMOVE_ENDPOINT_LEN);
        LittleEndian::write_u32(&mut out[0..4], MessageType::ZmqRemoveEndpoint.as_u32());
        encode_fixed(&mut out[TAG_LEN..], &self.endpoint);
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtoError> {
        debug_assert_eq!(buf.len(), ZMQ_REMOVE_ENDPOINT_LEN);
        Ok(Self { endpoint: decode_fixed(&buf[TAG_LEN..])? })
    }
}

/// Total on-wire byte length of the request for a given `MessageType`,
/// used by the connection handler to know how many more bytes to read
/// after the 4-byte tag (spec.md §4.1, §4.3).
pub fn request_len(msg_type: MessageType) -> usize {
    use MessageType::*;
    match msg_type {
        Invalid => HEADER_ONLY_LEN,
        GetProperties => HEADER_ONLY_LEN,
        GetProperty => GET_PROPERTY_LEN,
        SetProperty => SET_PROPERTY_LEN,
        StartRecording | StopRecording | StartReadout | StopReadout | Trigger => HEADER_ONLY_LEN,
        Grab => GRAB_LEN,
        Push => PUSH_LEN,
        StopPush => HEADER_ONLY_LEN,
        ZmqAddEndpoint => ZMQ_ADD_ENDPOINT_LEN,
        ZmqRemoveEndpoint => ZMQ_REMOVE_ENDPOINT_LEN,
        Write => WRITE_LEN,
        CloseConnection => HEADER_ONLY_LEN,
    }
}
