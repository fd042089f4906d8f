//! Connection lifecycle: the background worker, reconnect loop, and the
//! exclusive outbound write path.
//!
//! One worker thread per session alternates between connect attempts (with
//! exponential backoff) and a blocking receive loop. The worker exclusively
//! owns the reader half and the framer; sends from other threads funnel
//! through a single mutex-guarded writer so concurrent frames never
//! interleave. Cancellation is cooperative: the stop flag is checked after
//! every blocking operation returns, and the socket shutdown unblocks an
//! in-flight read.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use weart_protocol::{Message, WireFramer};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::{ClientEvent, Direction, EventBus};
use crate::transport::{Channel, ConnectParams, Transport};

/// State shared between the worker and the facade.
pub(crate) struct Shared {
    /// Cooperative cancellation flag.
    stop: AtomicBool,
    /// True iff the transport currently reports an open link.
    connected: AtomicBool,
    /// Writer half of the open channel; `None` while disconnected.
    writer: Mutex<Option<Box<dyn Channel>>>,
}

impl Shared {
    fn new() -> Self {
        Shared {
            stop: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            writer: Mutex::new(None),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Serialize and write one message through the exclusive writer path.
///
/// Returns `true` if the frame was written. While disconnected this is a
/// silent no-op (`false`); write failures are published as
/// [`ClientError::SendMessage`], never returned.
pub(crate) fn send_message(shared: &Shared, bus: &EventBus, message: &Message) -> bool {
    let text = message.encode();
    let bytes = WireFramer::encode_text_frame(&text);

    let result = {
        let mut writer = shared.writer.lock();
        match writer.as_mut() {
            Some(writer) => writer.write_all(&bytes),
            None => {
                log::debug!("dropping {} while disconnected", message.wire_tag());
                return false;
            }
        }
    };

    match result {
        Ok(()) => {
            bus.publish(ClientEvent::Message {
                direction: Direction::Sent,
                message: message.clone(),
            });
            bus.publish(ClientEvent::Text { direction: Direction::Sent, text });
            true
        }
        Err(e) => {
            bus.publish(ClientEvent::Error(ClientError::SendMessage(e.to_string())));
            false
        }
    }
}

/// Handle to one session's worker thread.
///
/// A fresh handle (and fresh shared state) is created per `start()`; stale
/// sockets are never reused across sessions.
pub(crate) struct ConnectionHandle {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    /// Spawn the worker for a new session.
    pub fn spawn(config: ClientConfig, transport: Arc<dyn Transport>, bus: EventBus) -> Self {
        let shared = Arc::new(Shared::new());
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("weart-client".to_string())
            .spawn(move || run_worker(config, transport, worker_shared, bus))
            .expect("failed to spawn client worker thread");

        ConnectionHandle { shared, worker: Some(worker) }
    }

    pub fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    /// Signal cancellation, unblock the worker, and wait for it to finish.
    pub fn stop(mut self) {
        self.shared.request_stop();
        if let Some(writer) = self.shared.writer.lock().as_ref() {
            writer.shutdown();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.shared.request_stop();
        if let Some(writer) = self.shared.writer.lock().as_ref() {
            writer.shutdown();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_worker(
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    bus: EventBus,
) {
    let params = ConnectParams {
        host: config.host.clone(),
        port: config.port,
        connect_timeout: config.connect_timeout,
        read_timeout: config.read_timeout,
    };
    let mut backoff = config.initial_backoff;
    let mut failed_attempts = 0u32;

    while !shared.stop_requested() {
        let channel = match transport.connect(&params) {
            Ok(channel) => channel,
            Err(e) => {
                if shared.stop_requested() {
                    break;
                }
                bus.publish(ClientEvent::Error(ClientError::Connection(e.to_string())));
                failed_attempts += 1;
                if let Some(max) = config.max_connect_attempts {
                    if failed_attempts >= max {
                        log::warn!("giving up after {failed_attempts} failed connect attempts");
                        break;
                    }
                }
                sleep_interruptible(backoff, &shared);
                backoff = (backoff * 2).min(config.max_backoff);
                continue;
            }
        };

        failed_attempts = 0;
        backoff = config.initial_backoff;

        let writer = match channel.try_clone() {
            Ok(writer) => writer,
            Err(e) => {
                bus.publish(ClientEvent::Error(ClientError::Connection(e.to_string())));
                continue;
            }
        };
        *shared.writer.lock() = Some(writer);
        shared.connected.store(true, Ordering::SeqCst);
        log::info!("connected to middleware at {}:{}", config.host, config.port);
        bus.publish(ClientEvent::ConnectionChanged(true));

        // Session handshake: announce ourselves before anything else.
        send_message(
            &shared,
            &bus,
            &Message::StartFromClient { tracking_type: config.tracking_type },
        );

        receive_loop(channel, &config, &shared, &bus);

        shared.connected.store(false, Ordering::SeqCst);
        if let Some(writer) = shared.writer.lock().take() {
            writer.shutdown();
        }
        log::info!("disconnected from middleware");
        bus.publish(ClientEvent::ConnectionChanged(false));
    }
}

/// Sleep the backoff in slices so a stop request is honored promptly.
fn sleep_interruptible(total: Duration, shared: &Shared) {
    let deadline = Instant::now() + total;
    while !shared.stop_requested() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(Duration::from_millis(50)));
    }
}

/// Read until cancellation, EOF, or a fatal transport error.
fn receive_loop(
    mut channel: Box<dyn Channel>,
    config: &ClientConfig,
    shared: &Shared,
    bus: &EventBus,
) {
    let mut framer = WireFramer::with_max_frame_len(config.max_frame_len);
    let mut buf = [0u8; 1024];

    loop {
        if shared.stop_requested() {
            return;
        }
        match channel.read(&mut buf) {
            Ok(0) => {
                // Expected during shutdown, a fault otherwise.
                if !shared.stop_requested() {
                    bus.publish(ClientEvent::Error(ClientError::Connection(
                        "connection closed by middleware".to_string(),
                    )));
                }
                return;
            }
            Ok(n) => {
                framer.push(&buf[..n]);
                loop {
                    match framer.next_frame() {
                        Ok(Some(text)) => dispatch_frame(&text, bus),
                        Ok(None) => break,
                        Err(e) => {
                            bus.publish(ClientEvent::Error(ClientError::ReceiveMessage(
                                e.to_string(),
                            )));
                        }
                    }
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock
                        | std::io::ErrorKind::TimedOut
                        | std::io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(e) => {
                if !shared.stop_requested() {
                    bus.publish(ClientEvent::Error(ClientError::ReceiveMessage(e.to_string())));
                }
                return;
            }
        }
    }
}

/// Decode one frame and publish its events: typed message first, raw text
/// second. Unknown tags are skipped silently; decode failures are reported
/// and the loop moves on to the next frame.
fn dispatch_frame(text: &str, bus: &EventBus) {
    match Message::decode(text) {
        Ok(Some(message)) => {
            bus.publish(ClientEvent::Message { direction: Direction::Received, message });
            bus.publish(ClientEvent::Text {
                direction: Direction::Received,
                text: text.to_string(),
            });
        }
        Ok(None) => log::debug!("skipping unrecognized record `{text}`"),
        Err(e) => {
            bus.publish(ClientEvent::Error(ClientError::ReceiveMessage(e.to_string())));
        }
    }
}
