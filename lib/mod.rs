// lib: buffered socket engine for session owners
// Implements a never-blocking send/receive facade over a reconnecting TCP
// link, with two background workers draining try-locked queues

// Re-export core state and address types
pub use bufsock_core::*;

// Re-export transport abstractions
pub use bufsock_transport::*;

pub mod config;
pub mod stats;

pub use config::EngineConfig;
pub use stats::{LinkStats, StatsSnapshot};

use bufsock_buffer::StagedQueue;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Library version, reported through [`version`].
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn version() -> &'static str {
    VERSION
}

/// Link status returned by [`BufferedSocket::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReceipt {
    /// The link was Connected at the moment of the call.
    pub connected: bool,
    /// A silent reconnect happened since the last time the flag was read.
    pub reconnected: bool,
}

// Everything the caller and both workers share. Lock order is queue before
// link; nothing takes a queue while holding the link except the receive
// worker pushing inbound, which no other path inverts.
struct Shared {
    config: EngineConfig,
    state: AtomicConnectionState,
    reconnected: ReconnectFlag,
    link: Mutex<Box<dyn Transport>>,
    outbound: StagedQueue<Vec<u8>>,
    inbound: StagedQueue<Vec<u8>>,
    stats: LinkStats,
}

impl Shared {
    // First connect, on the caller thread before the workers exist.
    // Failure is silent; the workers keep retrying on their cadence.
    fn initial_connect(&self) {
        if let Ok(mut link) = self.link.lock() {
            match link.connect() {
                Ok(()) => {
                    // Every successful connect raises the flag, the first
                    // one included
                    self.reconnected.set();
                    self.state.set(ConnectionState::Connected);
                    LinkStats::bump(&self.stats.connects);
                }
                Err(_) => LinkStats::bump(&self.stats.connect_failures),
            }
        }
    }

    /// One silent reconnect attempt. A no-op unless the link is currently
    /// Disconnected, which keeps Stopped terminal and repeat calls harmless.
    fn reconnect(&self) -> bool {
        if self.state.get() != ConnectionState::Disconnected {
            return false;
        }
        let mut link = match self.link.try_lock() {
            Ok(link) => link,
            Err(_) => return false,
        };
        // Recheck under the lock; stop() may have won the race
        if self.state.get() != ConnectionState::Disconnected {
            return false;
        }
        // Never reuse a handle that saw an error
        let _ = link.disconnect();
        match link.connect() {
            Ok(()) => {
                // Flag before state, so whoever sees Connected can trust it
                self.reconnected.set();
                self.state.set(ConnectionState::Connected);
                LinkStats::bump(&self.stats.connects);
                println!("bufsock: link reconnected");
                true
            }
            Err(_) => {
                LinkStats::bump(&self.stats.connect_failures);
                false
            }
        }
    }

    // Tear down a broken link. State flips first so the facade reports
    // Disconnected even while the handle close waits for the lock.
    fn mark_disconnected(&self) {
        self.state.set(ConnectionState::Disconnected);
        if let Ok(mut link) = self.link.lock() {
            let _ = link.disconnect();
        }
        eprintln!("bufsock: link error, starting silent reconnect");
    }

    // Worker exit path. Blocking here is fine, only workers call it.
    fn close_link(&self) {
        if let Ok(mut link) = self.link.lock() {
            let _ = link.disconnect();
        }
    }
}

// One write attempt against the front payload. Returns false when the link
// must be torn down.
fn flush_front(
    stats: &LinkStats,
    queue: &mut VecDeque<Vec<u8>>,
    link: &mut dyn Transport,
) -> bool {
    let front = match queue.front_mut() {
        Some(front) => front,
        None => return true,
    };

    match link.send(front) {
        Ok(n) if n == front.len() => {
            queue.pop_front();
            LinkStats::bump(&stats.sent);
            true
        }
        // Zero progress on a non-empty payload means the peer is gone
        Ok(0) => false,
        Ok(n) => {
            // Keep the unsent tail at the front so payload order holds
            front.drain(..n);
            LinkStats::bump(&stats.partial_writes);
            true
        }
        Err(_) => false,
    }
}

fn send_worker(shared: &Shared) {
    loop {
        match shared.state.get() {
            ConnectionState::Stopped => break,
            ConnectionState::Disconnected => {
                // Fixed-interval retry, no backoff
                shared.reconnect();
                thread::sleep(shared.config.idle_sleep);
                continue;
            }
            ConnectionState::Connected => {}
        }

        let mut did_work = false;
        let mut broke = false;

        if let Some(mut queue) = shared.outbound.try_active() {
            if !queue.is_empty() {
                did_work = true;
                if let Ok(mut link) = shared.link.try_lock() {
                    broke = !flush_front(&shared.stats, &mut queue, link.as_mut());
                }
            }
        }

        if broke {
            shared.mark_disconnected();
            continue;
        }

        thread::sleep(if did_work {
            shared.config.busy_sleep
        } else {
            shared.config.idle_sleep
        });
    }

    shared.close_link();
}

fn recv_worker(shared: &Shared) {
    let mut buf = vec![0u8; shared.config.read_chunk.max(1)];

    loop {
        match shared.state.get() {
            ConnectionState::Stopped => break,
            ConnectionState::Disconnected => {
                // Harmless double probe next to the send worker's retries
                shared.reconnect();
                thread::sleep(shared.config.recv_poll);
                continue;
            }
            ConnectionState::Connected => {}
        }

        let mut chunk: Option<Vec<u8>> = None;
        let mut broke = false;

        if let Ok(mut link) = shared.link.try_lock() {
            match link.receive(&mut buf) {
                // Graceful peer close: an empty chunk marks the boundary
                Ok(0) => {
                    chunk = Some(Vec::new());
                    broke = true;
                }
                Ok(n) => chunk = Some(buf[..n].to_vec()),
                Err(ref err) if is_timeout(err) => {}
                Err(_) => broke = true,
            }
        }

        if let Some(bytes) = chunk {
            shared.inbound.push(bytes);
            LinkStats::bump(&shared.stats.chunks_received);
        }

        if broke {
            shared.mark_disconnected();
        }

        thread::sleep(shared.config.recv_poll);
    }

    shared.close_link();
}

/// A resilient buffered TCP session.
///
/// All methods return promptly: payloads queue for a background send worker,
/// received chunks queue behind a background receive worker, and a broken
/// link repairs itself through silent fixed-interval reconnects. Callers that
/// care can watch [`BufferedSocket::state`] and the reconnected flag.
pub struct BufferedSocket {
    shared: Arc<Shared>,
    #[allow(dead_code)]
    workers: Vec<JoinHandle<()>>,
}

impl BufferedSocket {
    /// Open a session to `host:port`, configured from the environment.
    ///
    /// Returns after the first connect attempt whether or not it succeeded;
    /// a refused peer leaves the session Disconnected with the workers
    /// retrying in the background.
    pub fn open(host: &str, port: u16) -> Self {
        let config = EngineConfig::default();
        let endpoint = Endpoint::new(host, port);
        let transport = TcpTransport::new(endpoint.clone(), config.read_timeout);
        let session = Self::open_with(Box::new(transport), config);
        println!(
            "bufsock: session to {} open, state {}",
            endpoint,
            session.state()
        );
        session
    }

    /// Open a session over an explicit transport, for tests and custom
    /// backends.
    pub fn open_with(transport: Box<dyn Transport>, config: EngineConfig) -> Self {
        let shared = Arc::new(Shared {
            config,
            state: AtomicConnectionState::default(),
            reconnected: ReconnectFlag::new(),
            link: Mutex::new(transport),
            outbound: StagedQueue::new(),
            inbound: StagedQueue::new(),
            stats: LinkStats::new(),
        });

        shared.initial_connect();

        let mut workers = Vec::with_capacity(2);
        let send_shared = Arc::clone(&shared);
        workers.push(
            thread::Builder::new()
                .name("bufsock-send".to_string())
                .spawn(move || send_worker(&send_shared))
                .expect("Failed to spawn send worker"),
        );
        let recv_shared = Arc::clone(&shared);
        workers.push(
            thread::Builder::new()
                .name("bufsock-recv".to_string())
                .spawn(move || recv_worker(&recv_shared))
                .expect("Failed to spawn receive worker"),
        );

        BufferedSocket { shared, workers }
    }

    /// Queue a payload for transmission. Never blocks: under contention the
    /// payload takes the staging lane and keeps its position. Payloads
    /// queued after [`BufferedSocket::stop`] are dropped.
    pub fn enqueue(&self, payload: Vec<u8>) {
        if self.shared.state.get() == ConnectionState::Stopped {
            return;
        }
        LinkStats::bump(&self.shared.stats.enqueued);
        if !self.shared.outbound.push(payload) {
            LinkStats::bump(&self.shared.stats.spilled);
        }
    }

    /// Queue a payload and report link status in one call.
    ///
    /// `reconnected` consumes the edge-triggered flag: it reads true on the
    /// first send after a silent reconnect and false again until the next one.
    pub fn send(&self, payload: Vec<u8>) -> SendReceipt {
        self.enqueue(payload);
        SendReceipt {
            connected: self.shared.state.get() == ConnectionState::Connected,
            reconnected: self.shared.reconnected.consume(),
        }
    }

    /// Take the oldest received chunk. `None` means nothing is waiting or
    /// the receive side is momentarily contended. An empty chunk marks a
    /// peer close that triggered a reconnect.
    pub fn dequeue(&self) -> Option<Vec<u8>> {
        let mut queue = self.shared.inbound.try_active()?;
        queue.pop_front()
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.get()
    }

    /// Read and clear the reconnected flag without queueing anything.
    pub fn take_reconnected(&self) -> bool {
        self.shared.reconnected.consume()
    }

    /// Force one reconnect attempt now instead of waiting for the retry
    /// cadence. No-op when Connected or Stopped.
    pub fn reconnect(&self) -> bool {
        self.shared.reconnect()
    }

    /// Drop the current link. The workers start the silent reconnect cycle.
    pub fn disconnect(&self) {
        if self.shared.state.get() == ConnectionState::Stopped {
            return;
        }
        self.shared.state.set(ConnectionState::Disconnected);
        if let Ok(mut link) = self.shared.link.try_lock() {
            let _ = link.disconnect();
        }
    }

    /// Stop the session for good. Terminal: no later call revives the link.
    ///
    /// Never blocks. The state flips immediately; the workers see it on
    /// their next iteration, close the handle, and exit.
    pub fn stop(&self) {
        self.shared.state.set(ConnectionState::Stopped);
        if let Ok(mut link) = self.shared.link.try_lock() {
            let _ = link.disconnect();
        }
    }

    /// Payloads queued but not yet fully transmitted. Best effort under
    /// contention.
    pub fn pending_send(&self) -> usize {
        self.shared.outbound.len_hint()
    }

    /// Received chunks not yet taken by [`BufferedSocket::dequeue`].
    pub fn pending_recv(&self) -> usize {
        self.shared.inbound.len_hint()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }
}

impl Drop for BufferedSocket {
    fn drop(&mut self) {
        self.stop();
    }
}
