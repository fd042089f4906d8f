//! Integration tests against a mock middleware over real TCP sockets.
//!
//! Each test binds a listener on an ephemeral loopback port and drives the
//! client through connect/receive/send/stop scenarios. The one test that
//! exercises the standard middleware port is serialized.

use crossbeam_channel::Receiver;
use serial_test::serial;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use weart_client::{ClientConfig, ClientError, ClientEvent, Direction, WeartClient};
use weart_protocol::{
    CalibrationStatus, HandSide, Message, MiddlewareStatusKind, TrackingSample, TrackingType,
    DEFAULT_MIDDLEWARE_PORT,
};

const EVENT_TIMEOUT: Duration = Duration::from_secs(3);

// ============================================================================
// Mock middleware helpers
// ============================================================================

/// Spawn a listener on an ephemeral port and run `handler` on the first
/// accepted connection.
fn spawn_middleware<F>(handler: F) -> (u16, JoinHandle<()>)
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock middleware");
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            handler(stream);
        }
    });
    (port, handle)
}

/// Client config pointing at the mock, tuned for fast test turnaround.
fn test_config(port: u16) -> ClientConfig {
    ClientConfig::default()
        .with_port(port)
        .with_connect_timeout(Duration::from_millis(500))
        .with_read_timeout(Duration::from_millis(50))
        .with_backoff(Duration::from_millis(10), Duration::from_millis(50))
}

/// Consume (and discard) everything the client writes until it disconnects.
fn read_until_eof(stream: &mut TcpStream) -> Vec<u8> {
    let mut collected = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return collected,
            Ok(n) => collected.extend_from_slice(&buf[..n]),
        }
    }
}

fn wait_for_connection(events: &Receiver<ClientEvent>, up: bool) {
    let deadline = Instant::now() + EVENT_TIMEOUT;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(ClientEvent::ConnectionChanged(state)) if state == up => return,
            Ok(_) => continue,
            Err(_) => panic!("timed out waiting for ConnectionChanged({up})"),
        }
    }
}

/// Next inbound typed message, skipping everything else.
fn next_received_message(events: &Receiver<ClientEvent>) -> Message {
    let deadline = Instant::now() + EVENT_TIMEOUT;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(ClientEvent::Message { direction: Direction::Received, message }) => return message,
            Ok(_) => continue,
            Err(_) => panic!("timed out waiting for a received message"),
        }
    }
}

// ============================================================================
// Receive path
// ============================================================================

#[test]
fn test_connect_then_status_message() {
    let (port, server) = spawn_middleware(|mut stream| {
        stream.write_all(b"MW_STATUS;status=RUNNING;code=0~").unwrap();
        read_until_eof(&mut stream);
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();

    wait_for_connection(&events, true);
    assert_eq!(
        next_received_message(&events),
        Message::MiddlewareStatus {
            status: MiddlewareStatusKind::Running,
            version: String::new(),
            status_code: 0,
            error_desc: String::new(),
            actuations_enabled: false,
        }
    );

    client.stop();
    wait_for_connection(&events, false);
    server.join().unwrap();
}

#[test]
fn test_raw_text_follows_typed_message() {
    let (port, server) = spawn_middleware(|mut stream| {
        stream.write_all(b"WA_STATUS;status=IDLE~").unwrap();
        read_until_eof(&mut stream);
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();

    // For each inbound frame: typed Message first, raw Text second.
    let deadline = Instant::now() + EVENT_TIMEOUT;
    let mut inbound = Vec::new();
    while inbound.len() < 2 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining).expect("timed out") {
            e @ ClientEvent::Message { direction: Direction::Received, .. }
            | e @ ClientEvent::Text { direction: Direction::Received, .. } => inbound.push(e),
            _ => continue,
        }
    }
    assert!(matches!(inbound[0], ClientEvent::Message { .. }));
    assert_eq!(
        inbound[1],
        ClientEvent::Text {
            direction: Direction::Received,
            text: "WA_STATUS;status=IDLE".to_string(),
        }
    );

    client.stop();
    server.join().unwrap();
}

#[test]
fn test_two_frames_in_one_segment() {
    let (port, server) = spawn_middleware(|mut stream| {
        // Both frames in a single TCP segment.
        stream
            .write_all(b"WA_STATUS;status=IDLE~CALIBRATION_RESULT;hand=LEFT;success=true~")
            .unwrap();
        read_until_eof(&mut stream);
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();

    assert_eq!(
        next_received_message(&events),
        Message::WeartAppStatus { status: MiddlewareStatusKind::Idle }
    );
    assert_eq!(
        next_received_message(&events),
        Message::TrackingCalibrationResult { hand: HandSide::Left, success: true }
    );

    client.stop();
    server.join().unwrap();
}

#[test]
fn test_partial_frame_completed_by_later_read() {
    let (port, server) = spawn_middleware(|mut stream| {
        stream.write_all(b"CALIBRATION_STATUS;hand=RIGHT;status=CALIBRATING~").unwrap();
        stream.write_all(b"CALIBRATION_RESULT;hand=RIGHT;suc").unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(200));
        stream.write_all(b"cess=true~").unwrap();
        read_until_eof(&mut stream);
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();

    // The complete first frame arrives promptly.
    assert_eq!(
        next_received_message(&events),
        Message::TrackingCalibrationStatus {
            hand: HandSide::Right,
            status: CalibrationStatus::Calibrating,
        }
    );

    // The split frame must arrive exactly once, only after its tail.
    assert_eq!(
        next_received_message(&events),
        Message::TrackingCalibrationResult { hand: HandSide::Right, success: true }
    );

    client.stop();
    server.join().unwrap();
}

#[test]
fn test_inbound_order_is_preserved() {
    const COUNT: usize = 25;

    let (port, server) = spawn_middleware(|mut stream| {
        for i in 0..COUNT {
            let closure = i as f32 / COUNT as f32;
            let frame = format!("TRACKING;hand=LEFT;index.closure={closure}~");
            stream.write_all(frame.as_bytes()).unwrap();
        }
        read_until_eof(&mut stream);
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();

    for i in 0..COUNT {
        let expected = i as f32 / COUNT as f32;
        match next_received_message(&events) {
            Message::Tracking { sample: TrackingSample { index_closure, .. }, .. } => {
                assert_eq!(index_closure, expected, "frame {i} out of order");
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    client.stop();
    server.join().unwrap();
}

#[test]
fn test_unknown_record_is_skipped() {
    let (port, server) = spawn_middleware(|mut stream| {
        stream.write_all(b"HAPTIC_V2_PREVIEW;mode=fancy~EXIT~").unwrap();
        read_until_eof(&mut stream);
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();

    // The unknown record produces no event and does not stall the framer.
    assert_eq!(next_received_message(&events), Message::Exit);

    client.stop();
    server.join().unwrap();
}

#[test]
fn test_decode_error_does_not_abort_receive_loop() {
    let (port, server) = spawn_middleware(|mut stream| {
        stream.write_all(b"FORCE;hand=UP;point=THUMB;value=1~EXIT~").unwrap();
        read_until_eof(&mut stream);
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();

    let deadline = Instant::now() + EVENT_TIMEOUT;
    let mut saw_receive_error = false;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining).expect("timed out") {
            ClientEvent::Error(ClientError::ReceiveMessage(_)) => saw_receive_error = true,
            ClientEvent::Message { direction: Direction::Received, message } => {
                assert_eq!(message, Message::Exit);
                break;
            }
            _ => continue,
        }
    }
    assert!(saw_receive_error, "malformed frame should be reported");

    client.stop();
    server.join().unwrap();
}

// ============================================================================
// Send path
// ============================================================================

#[test]
fn test_outbound_commands_reach_the_wire() {
    let (frames_tx, frames_rx) = mpsc::channel();
    let (port, server) = spawn_middleware(move |mut stream| {
        let collected = read_until_eof(&mut stream);
        frames_tx.send(collected).unwrap();
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();

    wait_for_connection(&events, true);
    assert!(client.start_calibration());
    client.stop();

    let collected = frames_rx.recv_timeout(EVENT_TIMEOUT).unwrap();
    let text = String::from_utf8(collected).unwrap();
    let frames: Vec<&str> = text.split('~').filter(|f| !f.is_empty()).collect();
    assert_eq!(
        frames,
        vec![
            // Session handshake goes out first, then the command, then the
            // polite stop notice from stop().
            "START_FROM_CLIENT;tracking=TrackType1",
            "START_CALIBRATION",
            "STOP_FROM_CLIENT",
        ]
    );
    server.join().unwrap();
}

#[test]
fn test_session_open_can_be_reissued() {
    let (frames_tx, frames_rx) = mpsc::channel();
    let (port, server) = spawn_middleware(move |mut stream| {
        frames_tx.send(read_until_eof(&mut stream)).unwrap();
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();
    wait_for_connection(&events, true);

    // Renegotiate the tracking algorithm after the automatic handshake.
    assert!(client.send_start_device(TrackingType::Default));
    client.stop();

    let collected = frames_rx.recv_timeout(EVENT_TIMEOUT).unwrap();
    let text = String::from_utf8(collected).unwrap();
    let frames: Vec<&str> = text.split('~').filter(|f| !f.is_empty()).collect();
    assert_eq!(
        frames,
        vec![
            "START_FROM_CLIENT;tracking=TrackType1",
            "START_FROM_CLIENT;tracking=DEFAULT",
            "STOP_FROM_CLIENT",
        ]
    );
    server.join().unwrap();
}

#[test]
fn test_sent_messages_raise_events() {
    let (port, server) = spawn_middleware(|mut stream| {
        read_until_eof(&mut stream);
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();
    wait_for_connection(&events, true);

    assert!(client.start_raw_data());

    let deadline = Instant::now() + EVENT_TIMEOUT;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining).expect("timed out") {
            ClientEvent::Message { direction: Direction::Sent, message: Message::RawDataOn } => {
                break;
            }
            _ => continue,
        }
    }

    client.stop();
    server.join().unwrap();
}

#[test]
fn test_send_while_disconnected_is_silent_noop() {
    // Never started: nothing to write to, no panic, no event traffic.
    let client = WeartClient::new(test_config(1));
    let events = client.subscribe();

    assert!(!client.send_message(&Message::RawDataOn));
    assert!(!client.set_force(HandSide::Left, weart_protocol::ActuationPoint::Index, 0.5));
    assert!(events.try_recv().is_err());
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_stop_is_idempotent() {
    let (port, server) = spawn_middleware(|mut stream| {
        read_until_eof(&mut stream);
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();
    wait_for_connection(&events, true);

    client.stop();
    wait_for_connection(&events, false);

    // Second (and third) stop while already disconnected: no-op, no error.
    client.stop();
    client.stop();
    assert!(!client.is_connected());
    assert!(!client.send_message(&Message::RawDataOff));

    server.join().unwrap();
}

#[test]
fn test_reconnects_after_middleware_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        // First session: drop the client immediately.
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
        // Second session: hold until the client stops.
        let (mut stream, _) = listener.accept().unwrap();
        read_until_eof(&mut stream);
    });

    let client = WeartClient::new(test_config(port));
    let events = client.subscribe();
    client.start();

    wait_for_connection(&events, true);
    wait_for_connection(&events, false);
    wait_for_connection(&events, true);

    client.stop();
    server.join().unwrap();
}

#[test]
fn test_bounded_retries_give_up() {
    // Grab a free port and close the listener so connects are refused.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = test_config(port).with_max_connect_attempts(2);
    let client = WeartClient::new(config);
    let events = client.subscribe();
    client.start();

    let mut errors = 0;
    let deadline = Instant::now() + EVENT_TIMEOUT;
    while errors < 2 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining).expect("timed out waiting for connect errors") {
            ClientEvent::Error(ClientError::Connection(_)) => errors += 1,
            other => panic!("unexpected event {other:?}"),
        }
    }

    // The worker gave up; no further attempts are reported.
    assert!(events.recv_timeout(Duration::from_millis(200)).is_err());
    client.stop();
}

#[test]
#[serial]
fn test_default_port_scenario() {
    let listener = TcpListener::bind(("127.0.0.1", DEFAULT_MIDDLEWARE_PORT))
        .expect("standard middleware port busy");
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"MW_STATUS;status=RUNNING;code=0~").unwrap();
        read_until_eof(&mut stream);
    });

    // Stock configuration: loopback host and the standard port.
    let config = ClientConfig::default().with_read_timeout(Duration::from_millis(50));
    let client = WeartClient::new(config);
    let events = client.subscribe();
    client.start();

    wait_for_connection(&events, true);
    match next_received_message(&events) {
        Message::MiddlewareStatus { status, status_code, .. } => {
            assert_eq!(status, MiddlewareStatusKind::Running);
            assert_eq!(status_code, 0);
        }
        other => panic!("unexpected message {other:?}"),
    }

    client.stop();
    server.join().unwrap();
}
