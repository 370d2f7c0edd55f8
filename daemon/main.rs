// daemon: echo peer for buffered sessions (reader and writer decoupled)
use bufsock_buffer::TryQueue;
use bufsock_core::Endpoint;
use std::env;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const ECHOD_HOST: &str = "127.0.0.1";
const ECHOD_PORT: u16 = 3490;

fn timestamp() -> String {
    chrono::Local::now().format("%Y/%m/%d %H:%M:%S").to_string()
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut host = ECHOD_HOST.to_string();
    let mut port = ECHOD_PORT;

    // Parse arguments: -a <address> -p <port>
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-a" => {
                if i + 1 < args.len() {
                    host = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().unwrap_or(ECHOD_PORT);
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => {
                i += 1;
            }
        }
    }

    let endpoint = Endpoint::new(&host, port);
    let listener = TcpListener::bind(endpoint.addr()).expect("Failed to bind echo daemon");
    println!("[{}] bufsock-echod listening on {}", timestamp(), endpoint);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(_) => continue,
        };
        thread::spawn(move || serve(stream));
    }
}

// One connection: a reader thread parks inbound chunks on a backlog, the
// writer drains it back to the peer on a fixed cadence.
fn serve(stream: TcpStream) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("[{}] peer {} connected", timestamp(), peer);

    let backlog: Arc<TryQueue<Vec<u8>>> = Arc::new(TryQueue::new());

    let reader_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(err) => {
            eprintln!("[{}] peer {}: clone failed: {}", timestamp(), peer, err);
            return;
        }
    };

    let backlog_in = Arc::clone(&backlog);
    let reader_peer = peer.clone();
    let reader = thread::spawn(move || {
        let mut stream = reader_stream;
        let mut buf = vec![0u8; 4096];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    // Retry on backlog contention so no chunk is lost
                    let mut pending = Some(buf[..n].to_vec());
                    while let Some(payload) = pending.take() {
                        match backlog_in.try_lock() {
                            Some(mut queue) => queue.push_back(payload),
                            None => {
                                pending = Some(payload);
                                thread::yield_now();
                            }
                        }
                    }
                }
                Err(_) => break,
            }
        }
        println!("[{}] peer {} closed", timestamp(), reader_peer);
    });

    let mut stream = stream;
    loop {
        match backlog.try_pop() {
            Some(chunk) => {
                if stream.write_all(&chunk).is_err() {
                    break;
                }
            }
            None => {
                if reader.is_finished() && backlog.len_hint() == 0 {
                    break;
                }
                thread::sleep(Duration::from_millis(10));
            }
        }
    }

    let _ = stream.shutdown(Shutdown::Both);
    let _ = reader.join();
    println!("[{}] peer {} done", timestamp(), peer);
}
