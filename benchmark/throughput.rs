// throughput.rs - Benchmark queueing and drain rates against a mock peer
use bufsock_ng::{BufferedSocket, EngineConfig, MockTransport};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub struct ThroughputResult {
    pub test_name: String,
    pub num_threads: usize,
    pub total_payloads: u64,
    pub enqueue_duration: Duration,
    pub drain_duration: Duration,
    pub enqueue_rate: f64,
    pub drain_rate: f64,
    pub spilled: u64,
}

// Tight worker cadence so the drain numbers measure the queue, not the
// default sleeps
fn bench_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.busy_sleep = Duration::from_micros(50);
    config.idle_sleep = Duration::from_millis(1);
    config.recv_poll = Duration::from_millis(5);
    config
}

fn wait_for_sent(session: &BufferedSocket, expected: u64, timeout: Duration) -> Duration {
    let start = Instant::now();
    while session.stats().sent < expected && start.elapsed() < timeout {
        thread::sleep(Duration::from_millis(1));
    }
    start.elapsed()
}

/// One producer pushing payloads as fast as it can
pub fn bench_single_producer(num_payloads: usize, payload_len: usize) -> ThroughputResult {
    println!(
        "\n=== Benchmarking Single Producer ({} payloads of {} bytes) ===",
        num_payloads, payload_len
    );

    let transport = MockTransport::new();
    let session = BufferedSocket::open_with(Box::new(transport), bench_config());
    let payload = vec![0x42u8; payload_len];

    let start = Instant::now();
    for _ in 0..num_payloads {
        session.enqueue(payload.clone());
    }
    let enqueue_duration = start.elapsed();

    let drain_duration = wait_for_sent(&session, num_payloads as u64, Duration::from_secs(60));
    let stats = session.stats();
    session.stop();

    ThroughputResult {
        test_name: "Single Producer".to_string(),
        num_threads: 1,
        total_payloads: stats.enqueued,
        enqueue_duration,
        drain_duration,
        enqueue_rate: num_payloads as f64 / enqueue_duration.as_secs_f64(),
        drain_rate: num_payloads as f64 / drain_duration.as_secs_f64(),
        spilled: stats.spilled,
    }
}

/// Several producers sharing one session, exercising the staging lane
pub fn bench_multi_producer(num_threads: usize, payloads_per_thread: usize) -> ThroughputResult {
    println!(
        "\n=== Benchmarking {} Producers ({} payloads each) ===",
        num_threads, payloads_per_thread
    );

    let transport = MockTransport::new();
    let session = Arc::new(BufferedSocket::open_with(
        Box::new(transport),
        bench_config(),
    ));

    let start = Instant::now();
    let mut handles = vec![];
    for thread_id in 0..num_threads {
        let session = Arc::clone(&session);
        handles.push(thread::spawn(move || {
            for i in 0..payloads_per_thread {
                let payload = format!("producer {} payload {}", thread_id, i);
                session.enqueue(payload.into_bytes());
            }
        }));
    }
    for handle in handles {
        let _ = handle.join();
    }
    let enqueue_duration = start.elapsed();

    let total = (num_threads * payloads_per_thread) as u64;
    let drain_duration = wait_for_sent(&session, total, Duration::from_secs(60));
    let stats = session.stats();
    session.stop();

    ThroughputResult {
        test_name: format!("{} Producers", num_threads),
        num_threads,
        total_payloads: stats.enqueued,
        enqueue_duration,
        drain_duration,
        enqueue_rate: total as f64 / enqueue_duration.as_secs_f64(),
        drain_rate: total as f64 / drain_duration.as_secs_f64(),
        spilled: stats.spilled,
    }
}

pub fn print_throughput_results(results: &[ThroughputResult]) {
    println!("\n=== Throughput Results ===");
    println!(
        "{:<18} {:>7} {:>10} {:>14} {:>14} {:>8}",
        "Test", "Threads", "Payloads", "Enqueue/s", "Drain/s", "Spilled"
    );
    for r in results {
        println!(
            "{:<18} {:>7} {:>10} {:>14.0} {:>14.0} {:>8}",
            r.test_name, r.num_threads, r.total_payloads, r.enqueue_rate, r.drain_rate, r.spilled
        );
    }
}
