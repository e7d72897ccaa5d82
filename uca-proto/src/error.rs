//! Protocol-level error taxonomy (spec.md §4.1, §7 "Protocol" kind).

/// Errors the wire codec itself can produce. Transport and camera errors
/// live one layer up, in `uca-server`/`uca-client`.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    #[error("reply type tag {got:?} does not match request type tag {expected:?}")]
    TypeMismatch {
        expected: crate::MessageType,
        got: crate::MessageType,
    },

    #[error("field is not valid UTF-8")]
    Utf8,

    #[error("unknown message type discriminant {0}")]
    UnknownMessageType(u32),
}

pub type ProtoResult<T> = Result<T, ProtoError>;
