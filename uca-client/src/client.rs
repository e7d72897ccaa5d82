//! The client-side property mirror and per-operation request/reply calls
//! (spec.md §4.7, §5: "each request opens and closes its own connection").

use std::io::{Read, Write};
use std::net::TcpStream;

use uca_proto::descriptor::DESCRIPTOR_LEN;
use uca_proto::replies::{DEFAULT_REPLY_LEN, GET_PROPERTIES_REPLY_LEN, GET_PROPERTY_REPLY_LEN};
use uca_proto::requests::{
    encode_header_only, GET_PROPERTY_LEN, GRAB_LEN, HEADER_ONLY_LEN, PUSH_LEN, SET_PROPERTY_LEN,
    WRITE_LEN, ZMQ_ADD_ENDPOINT_LEN, ZMQ_REMOVE_ENDPOINT_LEN,
};
use uca_proto::{
    DefaultReply, GetPropertiesReply, GetPropertyReply, GetPropertyRequest, GrabRequest, MessageType,
    PropertyDescriptor, PushRequest, SetPropertyRequest, WriteRequest, ZmqAddEndpointRequest,
    ZmqRemoveEndpointRequest,
};

use crate::error::{ClientError, ClientResult};
use crate::host::HostProperty;

/// A handle to a remote camera daemon plus the host framework its
/// property list was mirrored into. Every operation after `connect`
/// opens a fresh TCP connection, per spec.md §2/§5.
pub struct CameraClient<H: HostProperty> {
    addr: String,
    host: H,
    properties: Vec<PropertyDescriptor>,
}

impl<H: HostProperty> CameraClient<H> {
    /// Performs the handshake: `GetProperties`, then installs every valid
    /// descriptor into `host`, skipping invalid ones (spec.md §9 Open
    /// Question: "skip invalid descriptors" resolution).
    pub fn connect(addr: impl Into<String>, mut host: H) -> ClientResult<Self> {
        let addr = addr.into();
        let mut stream = TcpStream::connect(&addr)?;

        let mut request = vec![0u8; HEADER_ONLY_LEN];
        encode_header_only(MessageType::GetProperties, &mut request);
        stream.write_all(&request)?;

        let mut header = vec![0u8; GET_PROPERTIES_REPLY_LEN];
        stream.read_exact(&mut header)?;
        let reply = GetPropertiesReply::decode(&header)?;

        let mut properties = Vec::with_capacity(reply.count as usize);
        for _ in 0..reply.count {
            let mut buf = vec![0u8; DESCRIPTOR_LEN];
            stream.read_exact(&mut buf)?;
            let descriptor = PropertyDescriptor::decode(&buf)?;
            if !descriptor.valid {
                tracing::warn!(name = %descriptor.name, "skipping invalid property descriptor");
                continue;
            }
            host.register(&descriptor);
            properties.push(descriptor);
        }
        host.on_ready();

        Ok(Self { addr, host, properties })
    }

    /// The descriptors received at handshake, beyond the base prefix
    /// (spec.md §4.2).
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn fresh_connection(&self) -> ClientResult<TcpStream> {
        Ok(TcpStream::connect(&self.addr)?)
    }

    fn expect_default_reply(stream: &mut TcpStream, msg_type: MessageType) -> ClientResult<()> {
        let mut buf = vec![0u8; DEFAULT_REPLY_LEN];
        stream.read_exact(&mut buf)?;
        let reply = DefaultReply::decode(&buf)?;
        if reply.msg_type != msg_type {
            return Err(ClientError::TypeMismatch { expected: msg_type, got: reply.msg_type });
        }
        if reply.error.occurred {
            return Err(ClientError::from_error_reply(&reply.error));
        }
        Ok(())
    }

    fn simple_call(&self, msg_type: MessageType) -> ClientResult<()> {
        let mut stream = self.fresh_connection()?;
        let mut request = vec![0u8; HEADER_ONLY_LEN];
        encode_header_only(msg_type, &mut request);
        stream.write_all(&request)?;
        Self::expect_default_reply(&mut stream, msg_type)
    }

    /// A direct `GetProperty` round-trip on a fresh connection. Also the
    /// wire-forwarding path `generic_get` delegates to by default.
    pub fn get_property(&self, name: &str) -> ClientResult<String> {
        let mut stream = self.fresh_connection()?;
        let mut request = vec![0u8; GET_PROPERTY_LEN];
        GetPropertyRequest { name: name.to_string() }.encode(&mut request);
        stream.write_all(&request)?;

        let mut buf = vec![0u8; GET_PROPERTY_REPLY_LEN];
        stream.read_exact(&mut buf)?;
        let reply = GetPropertyReply::decode(&buf)?;
        if reply.error.occurred {
            return Err(ClientError::from_error_reply(&reply.error));
        }
        Ok(reply.property_value)
    }

    /// A direct `SetProperty` round-trip on a fresh connection. Also the
    /// wire-forwarding path `generic_set` delegates to by default.
    pub fn set_property(&self, name: &str, value: &str) -> ClientResult<()> {
        Self::wire_set_property(&self.addr, name, value)
    }

    fn wire_set_property(addr: &str, name: &str, value: &str) -> ClientResult<()> {
        let mut stream = TcpStream::connect(addr)?;
        let mut request = vec![0u8; SET_PROPERTY_LEN];
        SetPropertyRequest { name: name.to_string(), value: value.to_string() }.encode(&mut request);
        stream.write_all(&request)?;
        Self::expect_default_reply(&mut stream, MessageType::SetProperty)
    }

    /// Reads a mirrored property by name through the installed host's
    /// generic-get chokepoint (spec.md §6.2(b), §4.7) rather than calling
    /// `get_property` directly, so a real host framework can intercept it.
    pub fn generic_get(&self, name: &str) -> ClientResult<String> {
        self.host.on_generic_get(name, &|n| self.get_property(n))
    }

    /// Writes a mirrored property by name through the installed host's
    /// generic-set chokepoint (spec.md §6.2(b), §4.7).
    pub fn generic_set(&mut self, name: &str, value: &str) -> ClientResult<()> {
        let addr = self.addr.clone();
        self.host
            .on_generic_set(name, value, &|n, v| Self::wire_set_property(&addr, n, v))
    }

    pub fn start_recording(&self) -> ClientResult<()> {
        self.simple_call(MessageType::StartRecording)
    }

    pub fn stop_recording(&self) -> ClientResult<()> {
        self.simple_call(MessageType::StopRecording)
    }

    pub fn start_readout(&self) -> ClientResult<()> {
        self.simple_call(MessageType::StartReadout)
    }

    pub fn stop_readout(&self) -> ClientResult<()> {
        self.simple_call(MessageType::StopReadout)
    }

    pub fn trigger(&self) -> ClientResult<()> {
        self.simple_call(MessageType::Trigger)
    }

    /// Sends `Grab { size }` and, on success, reads exactly `size` bytes
    /// (spec.md §8 scenario S2/S3: no payload follows a failed grab).
    pub fn grab(&self, size: u32) -> ClientResult<Vec<u8>> {
        let mut stream = self.fresh_connection()?;
        let mut request = vec![0u8; GRAB_LEN];
        GrabRequest { size }.encode(&mut request);
        stream.write_all(&request)?;

        let mut buf = vec![0u8; DEFAULT_REPLY_LEN];
        stream.read_exact(&mut buf)?;
        let reply = DefaultReply::decode(&buf)?;
        if reply.msg_type != MessageType::Grab {
            return Err(ClientError::TypeMismatch { expected: MessageType::Grab, got: reply.msg_type });
        }
        if reply.error.occurred {
            return Err(ClientError::from_error_reply(&reply.error));
        }

        let mut frame = vec![0u8; size as usize];
        stream.read_exact(&mut frame)?;
        Ok(frame)
    }

    /// Sends `Write { name, size }` immediately followed by `data`
    /// (bulk-in, no intervening reply — spec.md §4.3).
    pub fn write(&self, name: &str, data: &[u8]) -> ClientResult<()> {
        let mut stream = self.fresh_connection()?;
        let mut request = vec![0u8; WRITE_LEN];
        WriteRequest { name: name.to_string(), size: data.len() as u32 }.encode(&mut request);
        stream.write_all(&request)?;
        stream.write_all(data)?;
        Self::expect_default_reply(&mut stream, MessageType::Write)
    }

    /// Starts a streaming run. Blocks until the server reports the stream
    /// has ended (spec.md §4.3: "default reply with error when stream
    /// ends"); frames themselves arrive out-of-band via the registered
    /// zmq endpoints, not on this connection.
    pub fn push(&self, num_frames: i64) -> ClientResult<()> {
        let mut stream = self.fresh_connection()?;
        let mut request = vec![0u8; PUSH_LEN];
        PushRequest { num_frames }.encode(&mut request);
        stream.write_all(&request)?;
        Self::expect_default_reply(&mut stream, MessageType::Push)
    }

    /// Delivered on a fresh connection while a `Push` elsewhere is in
    /// progress (spec.md §5 "the sole exemption").
    pub fn stop_push(&self) -> ClientResult<()> {
        self.simple_call(MessageType::StopPush)
    }

    pub fn zmq_add_endpoint(
        &self,
        endpoint: &str,
        socket_type: u32,
        high_water_mark: u32,
    ) -> ClientResult<()> {
        let mut stream = self.fresh_connection()?;
        let mut request = vec![0u8; ZMQ_ADD_ENDPOINT_LEN];
        ZmqAddEndpointRequest { endpoint: endpoint.to_string(), socket_type, high_water_mark }
            .encode(&mut request);
        stream.write_all(&request)?;
        Self::expect_default_reply(&mut stream, MessageType::ZmqAddEndpoint)
    }

    pub fn zmq_remove_endpoint(&self, endpoint: &str) -> ClientResult<()> {
        let mut stream = self.fresh_connection()?;
        let mut request = vec![0u8; ZMQ_REMOVE_ENDPOINT_LEN];
        ZmqRemoveEndpointRequest { endpoint: endpoint.to_string() }.encode(&mut request);
        stream.write_all(&request)?;
        Self::expect_default_reply(&mut stream, MessageType::ZmqRemoveEndpoint)
    }

    /// Sends `CloseConnection` and drops the connection; there is no reply
    /// to read (spec.md §4.3 dispatch table).
    pub fn close(&self) -> ClientResult<()> {
        let mut stream = self.fresh_connection()?;
        let mut request = vec![0u8; HEADER_ONLY_LEN];
        encode_header_only(MessageType::CloseConnection, &mut request);
        stream.write_all(&request)?;
        Ok(())
    }
}

