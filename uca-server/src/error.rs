//! Server-side error taxonomy (spec.md §7): one enum per error kind plus
//! a top-level `ServerError` for `main`'s `Result`.

use uca_camera::CameraError;
use uca_proto::ProtoError;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    #[error("connection closed by peer")]
    BrokenPipe,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("endpoint already registered: {0}")]
    AlreadyExists(String),

    #[error("no such endpoint: {0}")]
    NotFound(String),

    #[error(transparent)]
    Bind(#[from] StreamError),
}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("failed to create zmq context/socket: {0}")]
    SocketCreation(String),

    #[error("failed to bind endpoint {endpoint}: {reason}")]
    Bind { endpoint: String, reason: String },

    #[error("send failed: {0}")]
    Send(String),

    #[error(transparent)]
    Camera(#[from] CameraError),
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtoError),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Maps any server-side error onto the wire `ErrorReply` (spec.md §7:
/// "Camera errors are carried in the ErrorReply payload verbatim").
pub fn to_error_reply(err: &ServerError) -> uca_proto::ErrorReply {
    match err {
        ServerError::Camera(c) => uca_proto::ErrorReply::failed(c.domain.clone(), c.code, c.message.clone()),
        ServerError::Stream(StreamError::Camera(c)) => {
            uca_proto::ErrorReply::failed(c.domain.clone(), c.code, c.message.clone())
        }
        ServerError::Registry(RegistryError::AlreadyExists(ep)) => {
            uca_proto::ErrorReply::failed("registry", 1, format!("endpoint already registered: {ep}"))
        }
        ServerError::Registry(RegistryError::NotFound(ep)) => {
            uca_proto::ErrorReply::failed("registry", 2, format!("no such endpoint: {ep}"))
        }
        ServerError::Registry(RegistryError::Bind(e)) => {
            uca_proto::ErrorReply::failed("registry", 3, e.to_string())
        }
        ServerError::Stream(s) => uca_proto::ErrorReply::failed("stream", 1, s.to_string()),
        other => uca_proto::ErrorReply::failed("server", 0, other.to_string()),
    }
}

/// `InvalidEndpoint` error code used on the wire by `ZmqAddEndpoint` and
/// `ZmqRemoveEndpoint` replies (spec.md §4.6, §8 scenario S6).
pub const INVALID_ENDPOINT_CODE: i32 = 1;
