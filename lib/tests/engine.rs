// Engine behavior against a scripted mock peer
use bufsock_ng::{
    BufferedSocket, ConnectionState, EngineConfig, MockTransport, RecvScript, SendScript,
};
use std::io::ErrorKind;
use std::thread;
use std::time::{Duration, Instant};

fn tight_config() -> EngineConfig {
    EngineConfig {
        busy_sleep: Duration::from_millis(1),
        idle_sleep: Duration::from_millis(5),
        recv_poll: Duration::from_millis(5),
        read_chunk: 256,
        read_timeout: Some(Duration::from_millis(5)),
    }
}

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

fn drain_one(session: &BufferedSocket) -> Vec<u8> {
    for _ in 0..500 {
        if let Some(chunk) = session.dequeue() {
            return chunk;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("no received chunk within the deadline");
}

#[test]
fn payload_order_is_preserved_on_the_wire() {
    let transport = MockTransport::new();
    let handle = transport.handle();
    let session = BufferedSocket::open_with(Box::new(transport), tight_config());

    session.enqueue(b"AB".to_vec());
    session.enqueue(b"CD".to_vec());

    assert!(wait_until(Duration::from_secs(2), || session.stats().sent == 2));
    assert_eq!(handle.sent_bytes(), b"ABCD");
    session.stop();
}

#[test]
fn partial_writes_resume_from_the_unsent_tail() {
    let transport = MockTransport::new();
    let handle = transport.handle();
    handle.script_send(SendScript::AcceptUpTo(1));
    handle.script_send(SendScript::AcceptUpTo(1));

    let session = BufferedSocket::open_with(Box::new(transport), tight_config());
    session.enqueue(b"XYZ".to_vec());

    assert!(wait_until(Duration::from_secs(2), || session.stats().sent == 1));
    assert_eq!(handle.sent_bytes(), b"XYZ");
    assert_eq!(handle.write_calls(), 3);
    assert_eq!(session.stats().partial_writes, 2);
    session.stop();
}

#[test]
fn send_failure_reconnects_and_resends_the_same_payload() {
    let transport = MockTransport::new();
    let handle = transport.handle();
    handle.script_send(SendScript::Error(ErrorKind::ConnectionReset));

    let session = BufferedSocket::open_with(Box::new(transport), tight_config());
    // The initial connect raises the flag; clear it so the assertion below
    // sees the reconnect, not the open
    assert!(session.take_reconnected());
    session.enqueue(b"hello".to_vec());

    assert!(wait_until(Duration::from_secs(2), || handle.sent_bytes()
        == b"hello"));
    assert_eq!(session.state(), ConnectionState::Connected);
    assert!(handle.connect_count() >= 2);
    assert!(session.take_reconnected());
    assert!(!session.take_reconnected());
    session.stop();
}

#[test]
fn send_receipt_reports_a_reconnect_exactly_once() {
    let transport = MockTransport::new();
    let handle = transport.handle();
    handle.script_send(SendScript::Error(ErrorKind::BrokenPipe));

    let session = BufferedSocket::open_with(Box::new(transport), tight_config());
    assert!(session.take_reconnected());
    session.enqueue(b"first".to_vec());
    assert!(wait_until(Duration::from_secs(2), || session.stats().sent == 1));

    let receipt = session.send(b"second".to_vec());
    assert!(receipt.connected);
    assert!(receipt.reconnected);

    let receipt = session.send(b"third".to_vec());
    assert!(receipt.connected);
    assert!(!receipt.reconnected);
    session.stop();
}

#[test]
fn enqueue_stays_prompt_while_the_link_stalls() {
    let transport = MockTransport::new();
    let handle = transport.handle();
    handle.script_send(SendScript::Stall(Duration::from_millis(300)));

    let session = BufferedSocket::open_with(Box::new(transport), tight_config());
    session.enqueue(b"slow".to_vec());

    // The worker is now inside the stalled write, holding queue and link
    assert!(wait_until(Duration::from_secs(1), || handle.write_calls() >= 1));

    let start = Instant::now();
    session.enqueue(b"fast".to_vec());
    assert!(
        start.elapsed() < Duration::from_millis(100),
        "enqueue blocked behind a stalled write"
    );

    assert!(wait_until(Duration::from_secs(2), || handle.sent_bytes()
        == b"slowfast"));
    assert!(session.stats().spilled >= 1);
    session.stop();
}

#[test]
fn payloads_queued_while_disconnected_flush_in_order() {
    let transport = MockTransport::new();
    let handle = transport.handle();
    // Keep the peer unreachable long enough to queue both payloads
    for _ in 0..20 {
        handle.script_connect(false);
    }

    let session = BufferedSocket::open_with(Box::new(transport), tight_config());
    assert_eq!(session.state(), ConnectionState::Disconnected);

    session.enqueue(b"AB".to_vec());
    session.enqueue(b"CD".to_vec());
    assert_eq!(session.pending_send(), 2);

    assert!(wait_until(Duration::from_secs(5), || handle.sent_bytes()
        == b"ABCD"));
    assert!(wait_until(Duration::from_secs(2), || session.pending_send() == 0));
    session.stop();
}

#[test]
fn graceful_close_surfaces_an_empty_chunk_and_reconnects() {
    let transport = MockTransport::new();
    let handle = transport.handle();
    handle.script_recv(RecvScript::Data(b"welcome".to_vec()));
    handle.script_recv(RecvScript::Eof);

    let session = BufferedSocket::open_with(Box::new(transport), tight_config());

    assert_eq!(drain_one(&session), b"welcome");
    assert_eq!(drain_one(&session), b"");
    assert_eq!(session.stats().chunks_received, 2);

    assert!(wait_until(Duration::from_secs(2), || handle.connect_count() >= 2));
    assert!(wait_until(Duration::from_secs(2), || session.state()
        == ConnectionState::Connected));
    session.stop();
}

#[test]
fn receive_errors_tear_the_link_down_without_a_marker() {
    let transport = MockTransport::new();
    let handle = transport.handle();
    handle.script_recv(RecvScript::Error(ErrorKind::ConnectionReset));

    let session = BufferedSocket::open_with(Box::new(transport), tight_config());

    assert!(wait_until(Duration::from_secs(2), || handle.connect_count() >= 2));
    assert_eq!(session.stats().chunks_received, 0);
    assert_eq!(session.pending_recv(), 0);
    session.stop();
}

#[test]
fn stop_is_terminal() {
    let transport = MockTransport::new();
    let handle = transport.handle();
    let session = BufferedSocket::open_with(Box::new(transport), tight_config());

    session.stop();
    assert_eq!(session.state(), ConnectionState::Stopped);

    assert!(!session.reconnect());
    assert_eq!(session.state(), ConnectionState::Stopped);

    session.enqueue(b"late".to_vec());
    assert_eq!(session.pending_send(), 0);

    let receipt = session.send(b"later".to_vec());
    assert!(!receipt.connected);

    assert!(wait_until(Duration::from_secs(2), || handle.disconnect_count()
        >= 1));
}

#[test]
fn failed_initial_connect_retries_in_the_background() {
    let transport = MockTransport::new();
    let handle = transport.handle();
    handle.script_connect(false);

    let session = BufferedSocket::open_with(Box::new(transport), tight_config());
    assert_eq!(session.state(), ConnectionState::Disconnected);

    assert!(wait_until(Duration::from_secs(2), || session.state()
        == ConnectionState::Connected));
    assert!(session.stats().connect_failures >= 1);
    assert!(handle.connect_attempts() >= 2);
    session.stop();
}

#[test]
fn forced_disconnect_heals_silently() {
    let transport = MockTransport::new();
    let session = BufferedSocket::open_with(Box::new(transport), tight_config());
    assert_eq!(session.state(), ConnectionState::Connected);
    assert!(session.take_reconnected());

    // Speculative reconnect while Connected is a no-op
    assert!(!session.reconnect());
    assert_eq!(session.state(), ConnectionState::Connected);

    session.disconnect();

    assert!(wait_until(Duration::from_secs(2), || session.take_reconnected()));
    assert!(wait_until(Duration::from_secs(1), || session.state()
        == ConnectionState::Connected));
    session.stop();
}
