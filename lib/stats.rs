// Per-link counters, updated with relaxed atomics from all three threads
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct LinkStats {
    pub enqueued: AtomicU64,
    pub spilled: AtomicU64,
    pub sent: AtomicU64,
    pub partial_writes: AtomicU64,
    pub chunks_received: AtomicU64,
    pub connects: AtomicU64,
    pub connect_failures: AtomicU64,
}

impl LinkStats {
    pub fn new() -> Self {
        LinkStats::default()
    }

    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            spilled: self.spilled.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            partial_writes: self.partial_writes.load(Ordering::Relaxed),
            chunks_received: self.chunks_received.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters, safe to hold across further traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Payloads accepted by `enqueue`/`send`.
    pub enqueued: u64,
    /// Enqueues that hit the staging lane because the send lock was held.
    pub spilled: u64,
    /// Payloads fully transmitted to the peer.
    pub sent: u64,
    /// Writes that moved only a prefix of the front payload.
    pub partial_writes: u64,
    /// Chunks stored by the receive loop (close markers included).
    pub chunks_received: u64,
    /// Successful connect attempts, the initial one included.
    pub connects: u64,
    /// Connect attempts that failed silently.
    pub connect_failures: u64,
}
