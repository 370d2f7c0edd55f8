// TCP transport implementation
use crate::traits::Transport;
use bufsock_core::Endpoint;
use std::io::{Read, Result, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Blocking TCP stream with a read timeout.
///
/// The stream is blocking so a zero-length read always means the peer closed
/// the connection gracefully; reads that merely have no data to deliver fail
/// with a timeout error instead (see [`crate::is_timeout`]).
pub struct TcpTransport {
    endpoint: Endpoint,
    read_timeout: Option<Duration>,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(endpoint: Endpoint, read_timeout: Option<Duration>) -> Self {
        TcpTransport {
            endpoint,
            read_timeout,
            stream: None,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, data: &[u8]) -> Result<usize> {
        if let Some(ref mut stream) = self.stream {
            stream.write(data)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Not connected",
            ))
        }
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        if let Some(ref mut stream) = self.stream {
            stream.read(buf)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Not connected",
            ))
        }
    }

    fn connect(&mut self) -> Result<()> {
        // Resolve on every attempt; the endpoint string is stable but its
        // DNS answer may not be.
        let addr = self
            .endpoint
            .addr()
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "no address resolved",
                )
            })?;

        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(self.read_timeout)?;

        // Payloads are latency-sensitive and already batched by the caller
        let _ = stream.set_nodelay(true);

        self.stream = Some(stream);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        // Dropping the stream closes the OS socket; the next connect()
        // allocates a fresh one.
        self.stream = None;
        Ok(())
    }
}
