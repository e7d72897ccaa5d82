//! The ambient host framework contract (spec.md §6.2): the client's local
//! camera object lives inside a framework capable of installing properties
//! dynamically and routing generic get/set calls to the mirror. This
//! workspace has no real such framework, so `LocalPropertyTable` stands in
//! for it — a minimal in-memory implementation good enough to drive tests.

use uca_proto::PropertyDescriptor;

use crate::error::ClientResult;

/// What `CameraClient` needs from the surrounding property framework: (a)
/// register a property by descriptor, (b) a chokepoint for generic get/set
/// keyed by property name, (c) a one-shot "connection ready" event.
///
/// `CameraClient::generic_get`/`generic_set` call (b) rather than forwarding
/// over the wire directly, so a real host framework can intercept, cache or
/// veto a property access before (or instead of) the round-trip. `fetch`/
/// `send` are that round-trip; the default implementations just delegate to
/// it unchanged.
pub trait HostProperty: Send {
    fn register(&mut self, descriptor: &PropertyDescriptor);

    /// Fired once, after every received descriptor has been installed.
    fn on_ready(&mut self) {}

    fn on_generic_get(&self, name: &str, fetch: &dyn Fn(&str) -> ClientResult<String>) -> ClientResult<String> {
        fetch(name)
    }

    fn on_generic_set(
        &mut self,
        name: &str,
        value: &str,
        send: &dyn Fn(&str, &str) -> ClientResult<()>,
    ) -> ClientResult<()> {
        send(name, value)
    }
}

/// Default `HostProperty` implementation: just remembers the descriptors
/// it was given, in install order.
#[derive(Debug, Default)]
pub struct LocalPropertyTable {
    installed: Vec<PropertyDescriptor>,
    ready: bool,
}

impl LocalPropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installed(&self) -> &[PropertyDescriptor] {
        &self.installed
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

impl HostProperty for LocalPropertyTable {
    fn register(&mut self, descriptor: &PropertyDescriptor) {
        self.installed.push(descriptor.clone());
    }

    fn on_ready(&mut self) {
        self.ready = true;
    }
}
