// Scripted in-memory transport for exercising the engine without a network
use crate::traits::Transport;
use std::collections::VecDeque;
use std::io::{Error, ErrorKind, Result};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Outcome of the next `send` call. The plan is consumed front to back;
/// an empty plan accepts everything.
#[derive(Debug, Clone)]
pub enum SendScript {
    /// Accept the whole buffer.
    Accept,
    /// Accept at most this many bytes (partial write).
    AcceptUpTo(usize),
    /// Sleep, then accept the whole buffer. Models a slow peer.
    Stall(Duration),
    /// Report zero bytes written.
    Zero,
    /// Fail with the given error kind.
    Error(ErrorKind),
}

/// Outcome of the next `receive` call. An empty plan times out.
#[derive(Debug, Clone)]
pub enum RecvScript {
    /// Deliver these bytes as one chunk.
    Data(Vec<u8>),
    /// Graceful peer close (read returns zero).
    Eof,
    /// Fail with the given error kind.
    Error(ErrorKind),
}

#[derive(Default)]
struct MockState {
    connected: bool,
    connect_plan: VecDeque<bool>,
    connect_attempts: usize,
    connects: usize,
    disconnects: usize,
    send_plan: VecDeque<SendScript>,
    recv_plan: VecDeque<RecvScript>,
    wire: Vec<u8>,
    writes: usize,
}

/// Test double for [`Transport`].
///
/// Every byte the engine manages to send lands on an internal wire record,
/// in order, which tests read back through a [`MockHandle`].
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// Cloneable inspection and scripting handle, valid after the transport
/// itself has moved into the engine.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        MockTransport::new()
    }
}

impl MockHandle {
    pub fn script_send(&self, script: SendScript) {
        self.state.lock().unwrap().send_plan.push_back(script);
    }

    pub fn script_recv(&self, script: RecvScript) {
        self.state.lock().unwrap().recv_plan.push_back(script);
    }

    /// Script the outcome of a future connect attempt (true = success).
    pub fn script_connect(&self, success: bool) {
        self.state.lock().unwrap().connect_plan.push_back(success);
    }

    /// All bytes accepted so far, concatenated in arrival order.
    pub fn sent_bytes(&self) -> Vec<u8> {
        self.state.lock().unwrap().wire.clone()
    }

    pub fn write_calls(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn connect_attempts(&self) -> usize {
        self.state.lock().unwrap().connect_attempts
    }

    pub fn connect_count(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn disconnect_count(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }
}

impl Transport for MockTransport {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        let script = {
            let mut state = self.state.lock().unwrap();
            if !state.connected {
                return Err(Error::new(ErrorKind::NotConnected, "Not connected"));
            }
            state.writes += 1;
            state.send_plan.pop_front().unwrap_or(SendScript::Accept)
        };

        // Stall outside the lock so inspection handles stay responsive
        let accepted = match script {
            SendScript::Accept => data.len(),
            SendScript::AcceptUpTo(n) => n.min(data.len()),
            SendScript::Stall(pause) => {
                thread::sleep(pause);
                data.len()
            }
            SendScript::Zero => return Ok(0),
            SendScript::Error(kind) => return Err(Error::new(kind, "scripted send failure")),
        };

        let mut state = self.state.lock().unwrap();
        state.wire.extend_from_slice(&data[..accepted]);
        Ok(accepted)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        if !state.connected {
            return Err(Error::new(ErrorKind::NotConnected, "Not connected"));
        }
        match state.recv_plan.pop_front() {
            Some(RecvScript::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Some(RecvScript::Eof) => Ok(0),
            Some(RecvScript::Error(kind)) => Err(Error::new(kind, "scripted recv failure")),
            None => Err(Error::new(ErrorKind::WouldBlock, "nothing scripted")),
        }
    }

    fn connect(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.connect_attempts += 1;
        let success = state.connect_plan.pop_front().unwrap_or(true);
        if success {
            state.connected = true;
            state.connects += 1;
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::ConnectionRefused,
                "scripted connect failure",
            ))
        }
    }

    fn disconnect(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.connected {
            state.disconnects += 1;
        }
        state.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accepted_bytes_in_order() {
        let mut mock = MockTransport::new();
        let handle = mock.handle();

        mock.connect().unwrap();
        assert_eq!(mock.send(b"AB").unwrap(), 2);
        assert_eq!(mock.send(b"CD").unwrap(), 2);
        assert_eq!(handle.sent_bytes(), b"ABCD");
        assert_eq!(handle.write_calls(), 2);
    }

    #[test]
    fn partial_script_accepts_a_prefix() {
        let mut mock = MockTransport::new();
        let handle = mock.handle();
        handle.script_send(SendScript::AcceptUpTo(1));

        mock.connect().unwrap();
        assert_eq!(mock.send(b"XYZ").unwrap(), 1);
        assert_eq!(handle.sent_bytes(), b"X");
    }

    #[test]
    fn unscripted_receive_times_out() {
        let mut mock = MockTransport::new();
        mock.connect().unwrap();

        let mut buf = [0u8; 8];
        let err = mock.receive(&mut buf).unwrap_err();
        assert!(crate::is_timeout(&err));
    }

    #[test]
    fn scripted_connect_failure_counts_the_attempt() {
        let mut mock = MockTransport::new();
        let handle = mock.handle();
        handle.script_connect(false);

        assert!(mock.connect().is_err());
        assert!(mock.connect().is_ok());
        assert_eq!(handle.connect_attempts(), 2);
        assert_eq!(handle.connect_count(), 1);
    }

    #[test]
    fn send_requires_a_connection() {
        let mut mock = MockTransport::new();
        assert_eq!(
            mock.send(b"A").unwrap_err().kind(),
            ErrorKind::NotConnected
        );
    }
}
