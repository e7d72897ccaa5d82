//! The camera object contract (spec.md §6.1). This is the "black box"
//! the server wraps; everything else in the daemon is built against this
//! trait alone, never against a concrete camera implementation.

use uca_proto::PropertyDescriptor;

use crate::error::CameraError;

/// Minimal capability set a real camera driver must expose for `ucad` to
/// drive it. Implementations are not required to be `Sync`: the server's
/// access serializer (spec.md §4.4) already guarantees single-threaded
/// access, so only `Send` is needed to move the camera into the server.
pub trait Camera: Send {
    /// Number of properties at the front of `list_properties()` that are
    /// common "base" properties the client already knows about and which
    /// `GetProperties` must not re-advertise (spec.md §4.2).
    const N_BASE_PROPERTIES: usize;

    fn get_property(&self, name: &str) -> Result<String, CameraError>;
    fn set_property(&mut self, name: &str, value: &str) -> Result<(), CameraError>;

    fn start_recording(&mut self) -> Result<(), CameraError>;
    fn stop_recording(&mut self) -> Result<(), CameraError>;
    fn start_readout(&mut self) -> Result<(), CameraError>;
    fn stop_readout(&mut self) -> Result<(), CameraError>;
    fn trigger(&mut self) -> Result<(), CameraError>;

    /// Acquires one frame into `buffer`, which is exactly the size the
    /// caller requested (the server resizes its reused grab buffer before
    /// calling this, spec.md §4.3 "Grab buffer reuse").
    fn grab(&mut self, buffer: &mut [u8]) -> Result<(), CameraError>;

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), CameraError>;

    /// All properties in stable declaration order, including the base
    /// prefix (spec.md §4.2).
    fn list_properties(&self) -> Vec<PropertyDescriptor>;

    fn is_recording(&self) -> bool;

    /// Current frame size in bytes, used by `Grab`/`Push` to size buffers.
    fn frame_size(&self) -> usize;
}
