//! Client-side behavior against a real daemon: property mirror install,
//! bulk write, and `Write`/`CloseConnection` request shapes.

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use uca_camera::SimulatedCamera;
use uca_client::{CameraClient, ClientError, ClientResult, HostProperty, LocalPropertyTable};
use uca_proto::PropertyDescriptor;

struct TestServer {
    addr: String,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start(camera: SimulatedCamera) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let handle = std::thread::spawn(move || {
            uca_server::serve(listener, camera, thread_running).unwrap();
        });
        Self { addr, running, handle: Some(handle) }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[test]
fn mirror_installs_every_property_beyond_the_base_prefix() {
    let server = TestServer::start(SimulatedCamera::new("sim0"));
    let client = CameraClient::connect(&server.addr, LocalPropertyTable::new()).unwrap();

    let installed_names: Vec<&str> = client.host().installed().iter().map(|d| d.name.as_str()).collect();
    assert!(installed_names.contains(&"exposure-time"));
    assert!(installed_names.contains(&"trigger-mode"));
    assert!(!installed_names.contains(&"name"), "base properties must not be re-advertised");
    assert!(!installed_names.contains(&"is-recording"));
    assert!(client.host().is_ready());
}

#[test]
fn write_sends_bulk_payload_before_reading_reply() {
    let server = TestServer::start(SimulatedCamera::new("sim0"));
    let client = CameraClient::connect(&server.addr, LocalPropertyTable::new()).unwrap();

    client.write("firmware", b"blob-of-bytes").unwrap();

    let err = client.write("no-such-target", b"x").unwrap_err();
    assert!(matches!(err, ClientError::Camera { .. }));
}

#[test]
fn close_sends_no_reply_and_does_not_error() {
    let server = TestServer::start(SimulatedCamera::new("sim0"));
    let client = CameraClient::connect(&server.addr, LocalPropertyTable::new()).unwrap();
    client.close().unwrap();
}

/// A host that intercepts every generic get/set instead of letting it
/// reach the wire, proving `generic_get`/`generic_set` actually route
/// through `HostProperty` rather than bypassing it.
#[derive(Default)]
struct InterceptingHost {
    sets_seen: Vec<(String, String)>,
}

impl HostProperty for InterceptingHost {
    fn register(&mut self, _descriptor: &PropertyDescriptor) {}

    fn on_generic_get(&self, name: &str, _fetch: &dyn Fn(&str) -> ClientResult<String>) -> ClientResult<String> {
        Ok(format!("intercepted:{name}"))
    }

    fn on_generic_set(
        &mut self,
        name: &str,
        value: &str,
        _send: &dyn Fn(&str, &str) -> ClientResult<()>,
    ) -> ClientResult<()> {
        self.sets_seen.push((name.to_string(), value.to_string()));
        Ok(())
    }
}

#[test]
fn generic_get_routes_through_the_host_chokepoint() {
    let server = TestServer::start(SimulatedCamera::new("sim0"));
    let client = CameraClient::connect(&server.addr, InterceptingHost::default()).unwrap();

    // The host's `on_generic_get` returns its own value instead of letting
    // the call reach the wire, so the daemon's real value must not surface.
    assert_eq!(client.generic_get("exposure-time").unwrap(), "intercepted:exposure-time");
}

#[test]
fn generic_set_routes_through_the_host_chokepoint() {
    let server = TestServer::start(SimulatedCamera::new("sim0"));
    let mut client = CameraClient::connect(&server.addr, InterceptingHost::default()).unwrap();

    client.generic_set("exposure-time", "9.0").unwrap();
    assert_eq!(client.host().sets_seen, vec![("exposure-time".to_string(), "9.0".to_string())]);

    // Intercepted, so the daemon's actual property must be untouched.
    assert_eq!(client.get_property("exposure-time").unwrap(), "1");
}

#[test]
fn generic_get_and_set_default_to_the_wire_forwarding_path() {
    let server = TestServer::start(SimulatedCamera::new("sim0"));
    let mut client = CameraClient::connect(&server.addr, LocalPropertyTable::new()).unwrap();

    client.generic_set("exposure-time", "3.5").unwrap();
    assert_eq!(client.generic_get("exposure-time").unwrap(), "3.5");
}
