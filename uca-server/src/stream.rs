//! The streaming fan-out engine (spec.md §4.5) and per-endpoint sender
//! tasks. Grounded on the zmq socket lifecycle pattern in
//! `feagi-io::next::implementations::zmq::server_implementations`
//! (bind/send/unbind on a `zmq::Socket`), adapted to a producer/N-sender
//! thread topology with a pair of bounded channels per endpoint
//! realizing the one-frame backpressure invariant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::Serialize;

use crate::error::StreamError;

/// One frame (or the terminal EOS marker) handed from the producer to
/// every endpoint's sender task (spec.md §3 "Streaming payload").
#[derive(Debug, Clone)]
pub struct StreamPayload {
    pub header: Vec<u8>,
    pub image: Vec<u8>,
}

impl StreamPayload {
    pub fn is_eos(&self) -> bool {
        self.image.is_empty()
    }
}

#[derive(Serialize)]
struct FrameHeader<'a> {
    #[serde(rename = "frame-number")]
    frame_number: u64,
    timestamp: String,
    dtype: &'a str,
    shape: [u32; 2],
}

#[derive(Serialize)]
struct EosHeader {
    end: bool,
}

pub fn frame_header_json(frame_number: u64, width: u32, height: u32, bytes_per_pixel: usize) -> Vec<u8> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let header = FrameHeader {
        frame_number,
        timestamp: format!("{}.{:06}", now.as_secs(), now.subsec_micros()),
        dtype: if bytes_per_pixel <= 1 { "uint8" } else { "uint16" },
        shape: [width, height],
    };
    serde_json::to_vec(&header).expect("frame header always serializes")
}

pub fn eos_header_json() -> Vec<u8> {
    serde_json::to_vec(&EosHeader { end: true }).expect("eos header always serializes")
}

/// A live registered endpoint: a bounded one-frame-deep data channel into
/// its sender thread, and a matching feedback channel back out, plus the
/// thread handle so removal can join it synchronously (spec.md §8
/// invariant 3).
pub struct EndpointNode {
    pub endpoint: String,
    data_tx: Option<Sender<StreamPayload>>,
    feedback_rx: Receiver<Result<(), String>>,
    sender_thread: Option<JoinHandle<()>>,
}

impl EndpointNode {
    /// Spawns the sender thread for a freshly bound zmq socket. The
    /// socket type/HWM were already applied by the caller (spec.md §4.6).
    pub fn spawn(endpoint: String, socket: zmq::Socket) -> Self {
        let (data_tx, data_rx) = bounded::<StreamPayload>(1);
        let (feedback_tx, feedback_rx) = bounded::<Result<(), String>>(1);

        let thread_endpoint = endpoint.clone();
        let sender_thread = std::thread::spawn(move || {
            sender_loop(&thread_endpoint, socket, &data_rx, &feedback_tx);
        });

        Self { endpoint, data_tx: Some(data_tx), feedback_rx, sender_thread: Some(sender_thread) }
    }

    /// Producer side: hand one frame to this endpoint. Blocks until the
    /// previous frame has been popped (one-frame backpressure).
    pub fn push(&self, payload: StreamPayload) -> Result<(), StreamError> {
        self.data_tx
            .as_ref()
            .expect("data_tx is only cleared by Drop")
            .send(payload)
            .map_err(|_| StreamError::Send(format!("endpoint {} sender thread is gone", self.endpoint)))
    }

    /// Producer side: wait for the previous frame's delivery status.
    pub fn wait_for_ack(&self) -> Result<(), StreamError> {
        match self.feedback_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(StreamError::Send(reason)),
            Err(_) => Err(StreamError::Send(format!("endpoint {} sender thread is gone", self.endpoint))),
        }
    }
}

impl Drop for EndpointNode {
    fn drop(&mut self) {
        // Drop `data_tx` first: that disconnects the channel, so the
        // sender thread's blocking `recv()` returns `Err` and it exits on
        // its own, and the join below always completes (spec.md §4.6
        // "Remove... unblocking and joining its sender task"). Field drop
        // order alone doesn't get us this — it runs after this fn returns.
        self.data_tx.take();
        if let Some(handle) = self.sender_thread.take() {
            let _ = handle.join();
        }
    }
}

fn sender_loop(
    endpoint: &str,
    socket: zmq::Socket,
    data_rx: &Receiver<StreamPayload>,
    feedback_tx: &Sender<Result<(), String>>,
) {
    loop {
        let payload = match data_rx.recv() {
            Ok(p) => p,
            Err(_) => return, // registry dropped us; nothing left to acknowledge
        };

        let more = !payload.is_eos();
        let send_flags = if more { zmq::SNDMORE } else { 0 };
        let result = socket
            .send(&payload.header, send_flags)
            .and_then(|()| if more { socket.send(&payload.image, 0) } else { Ok(()) })
            .map_err(|e| format!("zmq send to {endpoint} failed: {e}"));

        let stop = result.is_err() || payload.is_eos();
        let _ = feedback_tx.send(result);
        if stop {
            return;
        }
    }
}

/// One `Push` invocation's producer loop (spec.md §4.5). Owns no state
/// across invocations; `stop_flag` is the process-wide atomic the
/// `StopPush` handler sets.
pub struct PushEngine<'a> {
    pub stop_flag: &'a AtomicBool,
}

impl<'a> PushEngine<'a> {
    /// Runs one `Push{num_frames}` to completion against every endpoint
    /// currently in `endpoints`. `grab` is called once per iteration and
    /// must fill `buffer` to its existing length. Returns the number of
    /// frames actually delivered (for tests/telemetry).
    #[allow(clippy::too_many_arguments)]
    pub fn run<G>(
        &self,
        num_frames: i64,
        width: u32,
        height: u32,
        bytes_per_pixel: usize,
        mut buffer: Vec<u8>,
        endpoints: &[Arc<EndpointNode>],
        mut grab: G,
    ) -> Result<u64, StreamError>
    where
        G: FnMut(&mut [u8]) -> Result<(), crate::error::StreamError>,
    {
        let mut frame_number: u64 = 0;
        loop {
            let reached_count = num_frames >= 0 && frame_number >= num_frames as u64;
            if reached_count || self.stop_flag.load(Ordering::Relaxed) {
                self.emit_eos(endpoints)?;
                return Ok(frame_number);
            }

            // spec.md §4.5.b: on grab failure, break without EOS.
            grab(&mut buffer)?;

            let header = frame_header_json(frame_number, width, height, bytes_per_pixel);
            for ep in endpoints {
                ep.push(StreamPayload { header: header.clone(), image: buffer.clone() })?;
            }
            for ep in endpoints {
                ep.wait_for_ack()?;
            }

            frame_number += 1;
        }
    }

    fn emit_eos(&self, endpoints: &[Arc<EndpointNode>]) -> Result<(), StreamError> {
        let header = eos_header_json();
        for ep in endpoints {
            // Best-effort: an endpoint that already died shouldn't stop
            // EOS delivery to the others.
            let _ = ep.push(StreamPayload { header: header.clone(), image: Vec::new() });
        }
        for ep in endpoints {
            let _ = ep.wait_for_ack();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eos_payload_is_recognized() {
        let p = StreamPayload { header: eos_header_json(), image: Vec::new() };
        assert!(p.is_eos());
    }

    #[test]
    fn frame_header_reports_dtype_from_bitdepth() {
        let header = frame_header_json(3, 4, 2, 2);
        let text = String::from_utf8(header).unwrap();
        assert!(text.contains("\"frame-number\":3"));
        assert!(text.contains("\"dtype\":\"uint16\""));
        assert!(text.contains("\"shape\":[4,2]"));
    }

    /// The one-frame backpressure invariant (spec.md §4.5, §8 invariant
    /// and scenario S5): the producer cannot hand frame k+1 to a fast
    /// endpoint's sender thread until the slow endpoint has acknowledged
    /// frame k. Uses `inproc` (enforced purely inside libzmq, no kernel
    /// socket buffering to mask the effect) with HWM 1 on both sides of
    /// the pipe so a PULL reader that pauses stalls the matching PUSH
    /// `send()` deterministically.
    #[test]
    fn push_engine_blocks_the_whole_fan_out_on_the_slowest_endpoint() {
        let ctx = zmq::Context::new();
        let (fast_node, fast_consumer) = spawn_inproc_push_pull(&ctx, "inproc://backpressure-fast");
        let (slow_node, slow_consumer) = spawn_inproc_push_pull(&ctx, "inproc://backpressure-slow");

        const NUM_FRAMES: i64 = 4;
        const SLOW_DELAY: std::time::Duration = std::time::Duration::from_millis(80);

        let fast_reader = std::thread::spawn(move || drain_until_eos(&fast_consumer, std::time::Duration::ZERO));
        let slow_reader = std::thread::spawn(move || drain_until_eos(&slow_consumer, SLOW_DELAY));

        let stop_flag = AtomicBool::new(false);
        let engine = PushEngine { stop_flag: &stop_flag };
        let endpoints = vec![Arc::new(fast_node), Arc::new(slow_node)];

        let start = std::time::Instant::now();
        let delivered = engine
            .run(NUM_FRAMES, 1, 1, 1, vec![0u8], &endpoints, |buf| {
                buf[0] = buf[0].wrapping_add(1);
                Ok(())
            })
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(delivered, NUM_FRAMES as u64);
        assert_eq!(fast_reader.join().unwrap(), NUM_FRAMES as usize);
        assert_eq!(slow_reader.join().unwrap(), NUM_FRAMES as usize);
        // Without backpressure this whole exchange completes in well
        // under a millisecond; requiring at least two slow-consumer
        // delays rules that out while tolerating scheduling jitter.
        assert!(
            elapsed >= SLOW_DELAY * 2,
            "push engine ran in {elapsed:?}, faster than the slow endpoint could possibly allow"
        );
    }

    fn spawn_inproc_push_pull(ctx: &zmq::Context, endpoint: &str) -> (EndpointNode, zmq::Socket) {
        let push = ctx.socket(zmq::PUSH).unwrap();
        push.set_sndhwm(1).unwrap();
        push.bind(endpoint).unwrap();
        let pull = ctx.socket(zmq::PULL).unwrap();
        pull.set_rcvhwm(1).unwrap();
        pull.connect(endpoint).unwrap();
        (EndpointNode::spawn(endpoint.to_string(), push), pull)
    }

    /// Reads header(+image) pairs until the terminal EOS header, sleeping
    /// `delay` after each ordinary frame to simulate a slow consumer.
    /// Returns the number of ordinary (non-EOS) frames seen.
    fn drain_until_eos(socket: &zmq::Socket, delay: std::time::Duration) -> usize {
        let mut count = 0;
        loop {
            let header = socket.recv_bytes(0).unwrap();
            if socket.get_rcvmore().unwrap() {
                socket.recv_bytes(0).unwrap();
                count += 1;
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
            } else {
                assert_eq!(String::from_utf8(header).unwrap(), "{\"end\":true}");
                return count;
            }
        }
    }
}
