//! Endpoint registry (spec.md §4.6, §3 "Endpoint registry"). Add/remove
//! are only ever called while the access serializer is held
//! (spec.md §4.4), so the map itself needs no internal locking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{RegistryError, StreamError};
use crate::stream::EndpointNode;

#[derive(Default)]
pub struct EndpointRegistry {
    nodes: HashMap<String, Arc<EndpointNode>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Arc<EndpointNode>> {
        self.nodes.values().cloned().collect()
    }

    /// `ZmqAddEndpoint` (spec.md §4.6): fails with `AlreadyExists` if the
    /// endpoint string is already present, otherwise binds a fresh
    /// PUB/PUSH socket and spawns its sender task.
    pub fn add(
        &mut self,
        context: &zmq::Context,
        endpoint: String,
        socket_type: zmq::SocketType,
        high_water_mark: u32,
    ) -> Result<(), RegistryError> {
        if self.nodes.contains_key(&endpoint) {
            return Err(RegistryError::AlreadyExists(endpoint));
        }
        let socket = bind_socket(context, &endpoint, socket_type, high_water_mark)?;
        let node = EndpointNode::spawn(endpoint.clone(), socket);
        self.nodes.insert(endpoint, Arc::new(node));
        Ok(())
    }

    /// `ZmqRemoveEndpoint` (spec.md §4.6): fails with `NotFound` if
    /// absent; otherwise drops the node, which joins its sender thread
    /// and closes the socket (spec.md §8 invariant 3).
    pub fn remove(&mut self, endpoint: &str) -> Result<(), RegistryError> {
        self.nodes
            .remove(endpoint)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(endpoint.to_string()))
    }
}

fn bind_socket(
    context: &zmq::Context,
    endpoint: &str,
    socket_type: zmq::SocketType,
    high_water_mark: u32,
) -> Result<zmq::Socket, StreamError> {
    let socket = context
        .socket(socket_type)
        .map_err(|e| StreamError::SocketCreation(e.to_string()))?;
    socket
        .set_sndhwm(high_water_mark as i32)
        .map_err(|e| StreamError::SocketCreation(e.to_string()))?;
    socket
        .bind(endpoint)
        .map_err(|e| StreamError::Bind { endpoint: endpoint.to_string(), reason: e.to_string() })?;
    Ok(socket)
}
