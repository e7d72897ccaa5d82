//! The UCA-NET daemon library: connection handler, access serializer,
//! streaming fan-out engine and endpoint registry. `ucad` (`src/main.rs`)
//! is a thin CLI shell around `serve`.

pub mod access;
pub mod error;
pub mod handler;
pub mod registry;
pub mod stream;

use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uca_camera::Camera;

use crate::access::AccessSerializer;
use crate::error::ServerError;

/// Accepts connections on `listener` and spawns one thread per connection
/// (spec.md §5 "thread-per-connection"), until `running` is cleared.
/// Each in-flight handler completes its current message before observing
/// the flag; new connections stop being accepted immediately.
pub fn serve<C: Camera + 'static>(
    listener: TcpListener,
    camera: C,
    running: Arc<AtomicBool>,
) -> Result<(), ServerError> {
    let serializer = Arc::new(AccessSerializer::new(camera));
    let zmq_context = Arc::new(zmq::Context::new());
    listener.set_nonblocking(true)?;

    let mut workers = Vec::new();
    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                tracing::info!(%addr, "accepted connection");
                let serializer = Arc::clone(&serializer);
                let zmq_context = Arc::clone(&zmq_context);
                workers.push(std::thread::spawn(move || {
                    if let Err(e) = run_connection(stream, &serializer, &zmq_context) {
                        tracing::warn!(error = %e, %addr, "connection ended with error");
                    }
                }));
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(std::time::Duration::from_millis(25));
            }
            Err(e) => return Err(e.into()),
        }
    }

    for worker in workers {
        let _ = worker.join();
    }
    Ok(())
}

fn run_connection<C: Camera>(
    stream: TcpStream,
    serializer: &Arc<AccessSerializer<C>>,
    zmq_context: &Arc<zmq::Context>,
) -> Result<(), ServerError> {
    stream.set_nodelay(true).ok();
    handler::handle_connection(stream, serializer, zmq_context)
}
