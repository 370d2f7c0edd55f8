// Transport abstraction - allows pluggable communication backends
use std::io::{ErrorKind, Result};

/// A connectable byte-stream transport.
///
/// `send` and `receive` map directly onto one underlying write/read call and
/// may report partial progress; the engine owns retry and requeue policy.
/// `connect` must allocate a fresh handle every time it is called: a handle
/// that saw a fatal error is never reused across reconnects.
pub trait Transport: Send {
    fn send(&mut self, data: &[u8]) -> Result<usize>;
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize>;
    fn connect(&mut self) -> Result<()>;
    fn disconnect(&mut self) -> Result<()>;
}

/// True when a read failed only because the read timeout elapsed.
///
/// Timed-out reads surface as `WouldBlock` on Unix and `TimedOut` on Windows;
/// both mean "nothing to read yet", not a broken link.
pub fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}
