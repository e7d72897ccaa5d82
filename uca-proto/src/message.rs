use crate::error::ProtoError;

/// Message type tag. Numbering is positional and frozen as part of the
/// wire contract (spec.md §3) — never reorder or renumber a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    Invalid = 0,
    GetProperties = 1,
    GetProperty = 2,
    SetProperty = 3,
    StartRecording = 4,
    StopRecording = 5,
    StartReadout = 6,
    StopReadout = 7,
    Trigger = 8,
    Grab = 9,
    Push = 10,
    StopPush = 11,
    ZmqAddEndpoint = 12,
    ZmqRemoveEndpoint = 13,
    Write = 14,
    CloseConnection = 15,
}

impl MessageType {
    pub fn from_u32(value: u32) -> Result<Self, ProtoError> {
        use MessageType::*;
        Ok(match value {
            0 => Invalid,
            1 => GetProperties,
            2 => GetProperty,
            3 => SetProperty,
            4 => StartRecording,
            5 => StopRecording,
            6 => StartReadout,
            7 => StopReadout,
            8 => Trigger,
            9 => Grab,
            10 => Push,
            11 => StopPush,
            12 => ZmqAddEndpoint,
            13 => ZmqRemoveEndpoint,
            14 => Write,
            15 => CloseConnection,
            other => return Err(ProtoError::UnknownMessageType(other)),
        })
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}
