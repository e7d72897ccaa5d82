//! Wire protocol for UCA-NET: the fixed-layout request/reply structs and
//! property descriptor serialization shared by `uca-server` and
//! `uca-client` (spec.md §3, §4.1, §4.2).

pub mod descriptor;
pub mod error;
pub mod error_reply;
pub mod fixed_str;
pub mod message;
pub mod replies;
pub mod requests;
pub mod wire;

pub use descriptor::{PropertyDescriptor, PropertySpec, PropertyType};
pub use error::{ProtoError, ProtoResult};
pub use error_reply::ErrorReply;
pub use message::MessageType;
pub use replies::{DefaultReply, GetPropertiesReply, GetPropertyReply};
pub use requests::{
    GetPropertyRequest, GrabRequest, PushRequest, SetPropertyRequest, WriteRequest,
    ZmqAddEndpointRequest, ZmqRemoveEndpointRequest,
};
pub use wire::STAGING_BUFFER_LEN;
