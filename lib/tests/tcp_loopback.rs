// End-to-end behavior over real loopback sockets
use bufsock_ng::{BufferedSocket, ConnectionState, Endpoint, EngineConfig, TcpTransport};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

fn tight_config() -> EngineConfig {
    EngineConfig {
        busy_sleep: Duration::from_millis(1),
        idle_sleep: Duration::from_millis(5),
        recv_poll: Duration::from_millis(5),
        read_chunk: 512,
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

fn open_session(port: u16) -> BufferedSocket {
    let config = tight_config();
    let transport = TcpTransport::new(Endpoint::new("127.0.0.1", port), config.read_timeout);
    BufferedSocket::open_with(Box::new(transport), config)
}

#[test]
fn echoed_bytes_come_back_through_dequeue() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut buf = [0u8; 512];
        let mut echoed = 0;
        while echoed < 5 {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    stream.write_all(&buf[..n]).expect("echo");
                    echoed += n;
                }
            }
        }
    });

    let session = open_session(port);
    let receipt = session.send(b"ping!".to_vec());
    assert!(receipt.connected);

    let mut got = Vec::new();
    let start = Instant::now();
    while got.len() < 5 && start.elapsed() < Duration::from_secs(5) {
        match session.dequeue() {
            Some(chunk) => got.extend(chunk),
            None => thread::sleep(Duration::from_millis(2)),
        }
    }
    assert_eq!(got, b"ping!");

    session.stop();
    server.join().expect("server");
}

#[test]
fn payloads_buffer_while_the_peer_is_down_and_flush_on_reconnect() {
    // Grab a free port, then close the listener so connects are refused
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let session = open_session(port);
    assert_eq!(session.state(), ConnectionState::Disconnected);

    let receipt = session.send(b"queued while down".to_vec());
    assert!(!receipt.connected);
    assert_eq!(session.pending_send(), 1);

    // Bring a peer up on the same port and collect what arrives
    let listener = TcpListener::bind(("127.0.0.1", port)).expect("rebind");
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut got = Vec::new();
        let mut buf = [0u8; 512];
        let deadline = Instant::now() + Duration::from_secs(5);
        while got.len() < 17 && Instant::now() < deadline {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => got.extend_from_slice(&buf[..n]),
            }
        }
        got
    });

    assert!(wait_until(Duration::from_secs(5), || session.take_reconnected()));
    assert!(wait_until(Duration::from_secs(1), || session.state()
        == ConnectionState::Connected));

    let got = server.join().expect("server");
    assert_eq!(got, b"queued while down");
    assert!(wait_until(Duration::from_secs(2), || session.pending_send() == 0));
    session.stop();
}

#[test]
fn stop_closes_the_socket_promptly() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut buf = [0u8; 64];
        loop {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    });

    let session = open_session(port);
    assert_eq!(session.state(), ConnectionState::Connected);

    session.stop();
    assert_eq!(session.state(), ConnectionState::Stopped);

    // The peer observes the close once the workers wind down
    server.join().expect("server");
}
