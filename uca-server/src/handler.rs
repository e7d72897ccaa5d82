//! The per-connection handler (spec.md §4.3, §5): read a 4-byte tag, read
//! the rest of the fixed-size request, dispatch, write the reply and any
//! bulk payload, repeat until `CloseConnection` or the peer disappears.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use uca_camera::Camera;
use uca_proto::{
    requests::request_len, DefaultReply, ErrorReply, GetPropertiesReply, GetPropertyReply,
    GetPropertyRequest, GrabRequest, MessageType, ProtoError, PushRequest, SetPropertyRequest,
    WriteRequest, ZmqAddEndpointRequest, ZmqRemoveEndpointRequest,
};

use crate::access::AccessSerializer;
use crate::error::{to_error_reply, ServerError, TransportError};
use crate::stream::PushEngine;

const TAG_LEN: usize = 4;

/// Maps the request's `socket_type` field onto a zmq socket kind. The wire
/// only ever carries PUB or PUSH sockets (spec.md §1 Non-goals); any other
/// value is rejected before the registry is touched.
fn zmq_socket_type(raw: u32) -> Option<zmq::SocketType> {
    match raw {
        0 => Some(zmq::PUB),
        1 => Some(zmq::PUSH),
        _ => None,
    }
}

/// Runs one connection to completion. Errors returned here are transport
/// failures (broken pipe, short read); every other failure is caught,
/// mapped to an `ErrorReply`, and sent back over the wire instead of
/// unwinding the connection (spec.md §7).
pub fn handle_connection<C: Camera>(
    mut stream: TcpStream,
    serializer: &Arc<AccessSerializer<C>>,
    zmq_context: &Arc<zmq::Context>,
) -> Result<(), ServerError> {
    loop {
        let mut tag_buf = [0u8; TAG_LEN];
        match stream.read_exact(&mut tag_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(TransportError::Io(e).into()),
        }

        let msg_type = match uca_proto::wire::peek_message_type(&tag_buf) {
            Ok(t) => t,
            Err(ProtoError::UnknownMessageType(raw)) => {
                tracing::warn!(raw, "rejecting unknown message type");
                return Ok(());
            }
            Err(e) => return Err(ServerError::Protocol(e)),
        };

        let body_len = request_len(msg_type) - TAG_LEN;
        let mut body = vec![0u8; body_len];
        if body_len > 0 {
            stream
                .read_exact(&mut body)
                .map_err(|e| ServerError::from(TransportError::Io(e)))?;
        }
        let mut request = Vec::with_capacity(TAG_LEN + body_len);
        request.extend_from_slice(&tag_buf);
        request.extend_from_slice(&body);

        if msg_type == MessageType::CloseConnection || msg_type == MessageType::Invalid {
            return Ok(());
        }

        if msg_type == MessageType::StopPush {
            // The sole exemption (spec.md §4.4): accepted without the lock,
            // even while `Push` holds it on another connection.
            serializer.request_stop_push();
            write_default_reply(&mut stream, DefaultReply::ok(MessageType::StopPush))?;
            continue;
        }

        dispatch(&mut stream, &request, msg_type, serializer, zmq_context)?;
    }
}

fn dispatch<C: Camera>(
    stream: &mut TcpStream,
    request: &[u8],
    msg_type: MessageType,
    serializer: &Arc<AccessSerializer<C>>,
    zmq_context: &Arc<zmq::Context>,
) -> Result<(), ServerError> {
    match msg_type {
        MessageType::GetProperties => handle_get_properties(stream, serializer),
        MessageType::GetProperty => handle_get_property(stream, request, serializer),
        MessageType::SetProperty => handle_set_property(stream, request, serializer),
        MessageType::StartRecording => handle_simple(stream, msg_type, serializer, |c| c.start_recording()),
        MessageType::StopRecording => handle_simple(stream, msg_type, serializer, |c| c.stop_recording()),
        MessageType::StartReadout => handle_simple(stream, msg_type, serializer, |c| c.start_readout()),
        MessageType::StopReadout => handle_simple(stream, msg_type, serializer, |c| c.stop_readout()),
        MessageType::Trigger => handle_simple(stream, msg_type, serializer, |c| c.trigger()),
        MessageType::Grab => handle_grab(stream, request, serializer),
        MessageType::Write => handle_write(stream, request, serializer),
        MessageType::Push => handle_push(stream, request, serializer),
        MessageType::ZmqAddEndpoint => handle_zmq_add(stream, request, serializer, zmq_context),
        MessageType::ZmqRemoveEndpoint => handle_zmq_remove(stream, request, serializer),
        MessageType::StopPush | MessageType::CloseConnection | MessageType::Invalid => {
            unreachable!("handled by the caller before dispatch")
        }
    }
}

fn write_default_reply(stream: &mut TcpStream, reply: DefaultReply) -> Result<(), ServerError> {
    let mut buf = vec![0u8; uca_proto::replies::DEFAULT_REPLY_LEN];
    reply.encode(&mut buf);
    stream.write_all(&buf).map_err(|e| TransportError::Io(e).into())
}

fn handle_simple<C: Camera, F>(
    stream: &mut TcpStream,
    msg_type: MessageType,
    serializer: &Arc<AccessSerializer<C>>,
    op: F,
) -> Result<(), ServerError>
where
    F: FnOnce(&mut C) -> Result<(), uca_camera::CameraError>,
{
    let reply = {
        let mut guard = serializer.lock();
        match op(&mut guard.camera) {
            Ok(()) => DefaultReply::ok(msg_type),
            Err(e) => DefaultReply::failed(msg_type, to_error_reply(&ServerError::Camera(e))),
        }
    };
    write_default_reply(stream, reply)
}

fn handle_get_properties<C: Camera>(
    stream: &mut TcpStream,
    serializer: &Arc<AccessSerializer<C>>,
) -> Result<(), ServerError> {
    let descriptors = {
        let guard = serializer.lock();
        let all = guard.camera.list_properties();
        all[C::N_BASE_PROPERTIES.min(all.len())..].to_vec()
    };

    let mut header = vec![0u8; uca_proto::replies::GET_PROPERTIES_REPLY_LEN];
    GetPropertiesReply { count: descriptors.len() as u32 }.encode(&mut header);
    stream.write_all(&header).map_err(|e| ServerError::from(TransportError::Io(e)))?;

    for descriptor in &descriptors {
        let mut buf = vec![0u8; uca_proto::descriptor::DESCRIPTOR_LEN];
        descriptor.encode(&mut buf);
        stream.write_all(&buf).map_err(|e| ServerError::from(TransportError::Io(e)))?;
    }
    Ok(())
}

fn handle_get_property<C: Camera>(
    stream: &mut TcpStream,
    request: &[u8],
    serializer: &Arc<AccessSerializer<C>>,
) -> Result<(), ServerError> {
    let req = GetPropertyRequest::decode(request)?;
    let reply = {
        let guard = serializer.lock();
        match guard.camera.get_property(&req.name) {
            Ok(value) => GetPropertyReply { error: ErrorReply::ok(), property_value: value },
            Err(e) => GetPropertyReply {
                error: to_error_reply(&ServerError::Camera(e)),
                property_value: String::new(),
            },
        }
    };
    let mut buf = vec![0u8; uca_proto::replies::GET_PROPERTY_REPLY_LEN];
    reply.encode(&mut buf);
    stream.write_all(&buf).map_err(|e| TransportError::Io(e).into())
}

fn handle_set_property<C: Camera>(
    stream: &mut TcpStream,
    request: &[u8],
    serializer: &Arc<AccessSerializer<C>>,
) -> Result<(), ServerError> {
    let req = SetPropertyRequest::decode(request)?;
    let reply = {
        let mut guard = serializer.lock();
        match guard.camera.set_property(&req.name, &req.value) {
            Ok(()) => DefaultReply::ok(MessageType::SetProperty),
            Err(e) => {
                DefaultReply::failed(MessageType::SetProperty, to_error_reply(&ServerError::Camera(e)))
            }
        }
    };
    write_default_reply(stream, reply)
}

fn handle_grab<C: Camera>(
    stream: &mut TcpStream,
    request: &[u8],
    serializer: &Arc<AccessSerializer<C>>,
) -> Result<(), ServerError> {
    let req = GrabRequest::decode(request)?;
    let mut buffer = vec![0u8; req.size as usize];
    let reply = {
        let mut guard = serializer.lock();
        guard.camera.grab(&mut buffer)
    };

    let default_reply = match reply {
        Ok(()) => DefaultReply::ok(MessageType::Grab),
        Err(e) => DefaultReply::failed(MessageType::Grab, to_error_reply(&ServerError::Camera(e))),
    };
    let failed = default_reply.error.occurred;

    let mut out = vec![0u8; uca_proto::replies::DEFAULT_REPLY_LEN];
    default_reply.encode(&mut out);
    stream.write_all(&out).map_err(|e| ServerError::from(TransportError::Io(e)))?;

    if !failed {
        stream.write_all(&buffer).map_err(|e| ServerError::from(TransportError::Io(e)))?;
    }
    Ok(())
}

fn handle_write<C: Camera>(
    stream: &mut TcpStream,
    request: &[u8],
    serializer: &Arc<AccessSerializer<C>>,
) -> Result<(), ServerError> {
    let req = WriteRequest::decode(request)?;
    let mut data = vec![0u8; req.size as usize];
    stream
        .read_exact(&mut data)
        .map_err(|e| ServerError::from(TransportError::Io(e)))?;

    let reply = {
        let mut guard = serializer.lock();
        match guard.camera.write(&req.name, &data) {
            Ok(()) => DefaultReply::ok(MessageType::Write),
            Err(e) => DefaultReply::failed(MessageType::Write, to_error_reply(&ServerError::Camera(e))),
        }
    };
    write_default_reply(stream, reply)
}

fn handle_push<C: Camera>(
    stream: &mut TcpStream,
    request: &[u8],
    serializer: &Arc<AccessSerializer<C>>,
) -> Result<(), ServerError> {
    let req = PushRequest::decode(request)?;

    serializer.clear_stop_push();
    let reply = {
        let mut guard = serializer.lock();
        let width = u32_property(&guard.camera, "roi-width");
        let height = u32_property(&guard.camera, "roi-height");
        let bytes_per_pixel = if u32_property(&guard.camera, "sensor-bitdepth") <= 8 { 1 } else { 2 };
        let buffer = vec![0u8; guard.camera.frame_size()];
        let endpoints = guard.registry.snapshot();

        let engine = PushEngine { stop_flag: serializer.stop_flag() };
        let camera = &mut guard.camera;
        let result = engine.run(req.num_frames, width, height, bytes_per_pixel, buffer, &endpoints, |buf| {
            camera.grab(buf).map_err(Into::into)
        });

        match result {
            Ok(_delivered) => DefaultReply::ok(MessageType::Push),
            Err(e) => DefaultReply::failed(MessageType::Push, to_error_reply(&ServerError::Stream(e))),
        }
    };
    write_default_reply(stream, reply)
}

fn u32_property<C: Camera>(camera: &C, name: &str) -> u32 {
    camera.get_property(name).ok().and_then(|v| v.parse().ok()).unwrap_or(0)
}

fn handle_zmq_add<C: Camera>(
    stream: &mut TcpStream,
    request: &[u8],
    serializer: &Arc<AccessSerializer<C>>,
    zmq_context: &Arc<zmq::Context>,
) -> Result<(), ServerError> {
    let req = ZmqAddEndpointRequest::decode(request)?;
    let reply = {
        let Some(socket_type) = zmq_socket_type(req.socket_type) else {
            let error = ErrorReply::failed(
                "registry",
                crate::error::INVALID_ENDPOINT_CODE,
                format!("unsupported socket type {}", req.socket_type),
            );
            return write_default_reply(stream, DefaultReply::failed(MessageType::ZmqAddEndpoint, error));
        };
        let mut guard = serializer.lock();
        match guard.registry.add(zmq_context, req.endpoint, socket_type, req.high_water_mark) {
            Ok(()) => DefaultReply::ok(MessageType::ZmqAddEndpoint),
            Err(e) => {
                DefaultReply::failed(MessageType::ZmqAddEndpoint, to_error_reply(&ServerError::Registry(e)))
            }
        }
    };
    write_default_reply(stream, reply)
}

fn handle_zmq_remove<C: Camera>(
    stream: &mut TcpStream,
    request: &[u8],
    serializer: &Arc<AccessSerializer<C>>,
) -> Result<(), ServerError> {
    let req = ZmqRemoveEndpointRequest::decode(request)?;
    let reply = {
        let mut guard = serializer.lock();
        match guard.registry.remove(&req.endpoint) {
            Ok(()) => DefaultReply::ok(MessageType::ZmqRemoveEndpoint),
            Err(e) => DefaultReply::failed(
                MessageType::ZmqRemoveEndpoint,
                to_error_reply(&ServerError::Registry(e)),
            ),
        }
    };
    write_default_reply(stream, reply)
}
