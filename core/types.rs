// Core types used across all bufsock components
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

// Connection lifecycle state. Stopped is terminal: once a link is stopped
// it never transitions back to Disconnected or Connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connected = 1,
    Stopped = 2,
}

impl ConnectionState {
    pub fn from_u8(val: u8) -> Self {
        match val {
            1 => ConnectionState::Connected,
            2 => ConnectionState::Stopped,
            _ => ConnectionState::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "DISCONNECTED"),
            ConnectionState::Connected => write!(f, "CONNECTED"),
            ConnectionState::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Connection state shared between the caller and both worker threads.
///
/// Reads are lock-free. All writes funnel through [`AtomicConnectionState::set`],
/// which enforces that Stopped is absorbing.
#[derive(Debug)]
pub struct AtomicConnectionState(AtomicU8);

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        AtomicConnectionState(AtomicU8::new(state as u8))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Store a new state. Ignored once the state is Stopped, so a racing
    /// connect or disconnect can never resurrect a stopped link.
    pub fn set(&self, state: ConnectionState) {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if ConnectionState::from_u8(current) == ConnectionState::Stopped {
                return;
            }
            match self.0.compare_exchange_weak(
                current,
                state as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}

impl Default for AtomicConnectionState {
    fn default() -> Self {
        AtomicConnectionState::new(ConnectionState::Disconnected)
    }
}

/// Edge-triggered reconnection flag.
///
/// Set on every successful (re)connect, cleared only by [`ReconnectFlag::consume`].
/// It is a level, not a counter: several reconnects before one consume still
/// read true exactly once.
#[derive(Debug, Default)]
pub struct ReconnectFlag(AtomicBool);

impl ReconnectFlag {
    pub fn new() -> Self {
        ReconnectFlag(AtomicBool::new(false))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Read and clear the flag in one step.
    pub fn consume(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Non-destructive read, for diagnostics only.
    pub fn peek(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Remote peer address, captured once per session and reused verbatim on
/// every reconnect attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: &str, port: u16) -> Self {
        Endpoint {
            host: host.to_string(),
            port,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_is_absorbing() {
        let state = AtomicConnectionState::new(ConnectionState::Disconnected);
        state.set(ConnectionState::Connected);
        assert_eq!(state.get(), ConnectionState::Connected);

        state.set(ConnectionState::Stopped);
        assert_eq!(state.get(), ConnectionState::Stopped);

        state.set(ConnectionState::Connected);
        assert_eq!(state.get(), ConnectionState::Stopped);
        state.set(ConnectionState::Disconnected);
        assert_eq!(state.get(), ConnectionState::Stopped);
    }

    #[test]
    fn reconnect_flag_reads_true_exactly_once() {
        let flag = ReconnectFlag::new();
        assert!(!flag.consume());

        flag.set();
        flag.set(); // second reconnect before anyone looked
        assert!(flag.consume());
        assert!(!flag.consume());
    }

    #[test]
    fn endpoint_renders_host_and_port() {
        let ep = Endpoint::new("127.0.0.1", 3490);
        assert_eq!(ep.addr(), "127.0.0.1:3490");
        assert_eq!(format!("{}", ep), "127.0.0.1:3490");
    }
}
