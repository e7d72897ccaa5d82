//! The access serializer (spec.md §4.4): a single process-wide exclusive
//! lock over the camera and endpoint registry, with an atomic flag that
//! bypasses it entirely for `StopPush` — the sole exemption.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use uca_camera::Camera;

use crate::registry::EndpointRegistry;

/// Everything a handler needs exclusive access to: the camera and the
/// endpoint registry. Bundled in one mutex so `ZmqAddEndpoint`/
/// `ZmqRemoveEndpoint` (which touch only the registry) still serialize
/// against `Grab`/`Push` (which touch only the camera), matching
/// spec.md §4.4 ("so the registry is not mutated mid-frame").
pub struct GuardedState<C: Camera> {
    pub camera: C,
    pub registry: EndpointRegistry,
}

pub struct AccessSerializer<C: Camera> {
    state: Mutex<GuardedState<C>>,
    /// Written without the lock; tolerates a delayed read by the single
    /// consumer (the push producer loop), per spec.md §5 and §9.
    stop_stream: AtomicBool,
}

impl<C: Camera> AccessSerializer<C> {
    pub fn new(camera: C) -> Self {
        Self {
            state: Mutex::new(GuardedState { camera, registry: EndpointRegistry::new() }),
            stop_stream: AtomicBool::new(false),
        }
    }

    /// Acquired by every handler except `StopPush` (spec.md §4.4).
    pub fn lock(&self) -> parking_lot::MutexGuard<'_, GuardedState<C>> {
        self.state.lock()
    }

    pub fn stop_flag(&self) -> &AtomicBool {
        &self.stop_stream
    }

    /// `StopPush`'s entire effect: set the flag, observed cooperatively
    /// by the push producer loop at the top of its next iteration
    /// (spec.md §4.5 "Remote stop").
    pub fn request_stop_push(&self) {
        self.stop_stream.store(true, Ordering::Relaxed);
    }

    /// Cleared by the `Push` handler before it starts a new run, so a
    /// stale flag from a previous stream doesn't immediately abort it.
    pub fn clear_stop_push(&self) {
        self.stop_stream.store(false, Ordering::Relaxed);
    }
}
