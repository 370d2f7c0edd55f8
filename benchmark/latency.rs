// latency.rs - Round-trip and reconnect recovery timing over loopback TCP
use bufsock_ng::{BufferedSocket, Endpoint, EngineConfig, TcpTransport};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

pub struct LatencyResult {
    pub test_name: String,
    pub samples: usize,
    pub min: Duration,
    pub avg: Duration,
    pub max: Duration,
}

fn bench_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.busy_sleep = Duration::from_millis(1);
    config.idle_sleep = Duration::from_millis(2);
    config.recv_poll = Duration::from_millis(1);
    config.read_timeout = Some(Duration::from_millis(2));
    config
}

// Echo every chunk back until the peer hangs up, then accept again
fn spawn_echo_listener() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind echo listener");
    let port = listener.local_addr().expect("no local addr").port();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = match stream {
                Ok(s) => s,
                Err(_) => continue,
            };
            let mut buf = [0u8; 4096];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if stream.write_all(&buf[..n]).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });
    port
}

fn open_session(port: u16) -> BufferedSocket {
    let config = bench_config();
    let transport = TcpTransport::new(Endpoint::new("127.0.0.1", port), config.read_timeout);
    BufferedSocket::open_with(Box::new(transport), config)
}

/// Time from enqueue to the echoed chunk surfacing in dequeue
pub fn bench_loopback_latency(num_samples: usize) -> LatencyResult {
    println!(
        "\n=== Benchmarking Loopback Round-Trip ({} samples) ===",
        num_samples
    );

    let port = spawn_echo_listener();
    let session = open_session(port);
    let payload = b"ping".to_vec();

    let mut rtts = Vec::with_capacity(num_samples);
    for _ in 0..num_samples {
        let start = Instant::now();
        session.enqueue(payload.clone());
        loop {
            if let Some(chunk) = session.dequeue() {
                if !chunk.is_empty() {
                    break;
                }
            }
            if start.elapsed() > Duration::from_secs(5) {
                break;
            }
            thread::yield_now();
        }
        rtts.push(start.elapsed());
    }

    session.stop();
    summarize("Loopback Round-Trip", &rtts)
}

/// Time from a peer hang-up to the link reading Connected again
pub fn bench_reconnect_recovery(cycles: usize) -> LatencyResult {
    println!(
        "\n=== Benchmarking Reconnect Recovery ({} cycles) ===",
        cycles
    );

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind drop listener");
    let port = listener.local_addr().expect("no local addr").port();

    // Accept and hang up immediately, once per expected connect
    let server = thread::spawn(move || {
        for _ in 0..=cycles {
            if let Ok((stream, _)) = listener.accept() {
                drop(stream);
            }
        }
    });

    let session = open_session(port);
    // The initial connect raises the flag too; clear it so every sample
    // measures a real recovery
    let _ = session.take_reconnected();

    let mut recoveries = Vec::with_capacity(cycles);
    for _ in 0..cycles {
        let start = Instant::now();
        while !session.take_reconnected() {
            if start.elapsed() > Duration::from_secs(5) {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        recoveries.push(start.elapsed());
    }

    session.stop();
    let _ = server.join();
    summarize("Reconnect Recovery", &recoveries)
}

fn summarize(name: &str, samples: &[Duration]) -> LatencyResult {
    let min = samples.iter().min().copied().unwrap_or_default();
    let max = samples.iter().max().copied().unwrap_or_default();
    let total: Duration = samples.iter().sum();
    let avg = if samples.is_empty() {
        Duration::ZERO
    } else {
        total / samples.len() as u32
    };

    LatencyResult {
        test_name: name.to_string(),
        samples: samples.len(),
        min,
        avg,
        max,
    }
}

pub fn print_latency_results(results: &[LatencyResult]) {
    println!("\n=== Latency Results ===");
    println!(
        "{:<22} {:>8} {:>12} {:>12} {:>12}",
        "Test", "Samples", "Min(ms)", "Avg(ms)", "Max(ms)"
    );
    for r in results {
        println!(
            "{:<22} {:>8} {:>12.3} {:>12.3} {:>12.3}",
            r.test_name,
            r.samples,
            r.min.as_secs_f64() * 1000.0,
            r.avg.as_secs_f64() * 1000.0,
            r.max.as_secs_f64() * 1000.0
        );
    }
}
