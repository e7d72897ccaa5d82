//! Client-side error taxonomy (spec.md §7, mirrored from the server's).

use uca_proto::ProtoError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A connect/read/write failure. Per the Open Question resolution in
    /// SPEC_FULL.md §9, a failed connect is always a fatal per-operation
    /// error rather than something callers can ignore.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtoError),

    /// The reply's type tag didn't match the request's.
    #[error("reply type mismatch: expected {expected:?}, got {got:?}")]
    TypeMismatch { expected: uca_proto::MessageType, got: uca_proto::MessageType },

    /// A camera-side failure, carried verbatim from the server's `ErrorReply`.
    #[error("{domain}: {message} (code {code})")]
    Camera { domain: String, code: i32, message: String },
}

impl ClientError {
    pub(crate) fn from_error_reply(error: &uca_proto::ErrorReply) -> Self {
        Self::Camera { domain: error.domain.clone(), code: error.code, message: error.message.clone() }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
