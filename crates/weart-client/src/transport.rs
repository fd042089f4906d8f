//! Transport abstraction and the standard TCP implementation.
//!
//! The connection manager only sees the [`Transport`] and [`Channel`]
//! traits, so alternate transports (a BLE tunnel, an in-memory pipe for
//! tests) can substitute for TCP without touching any message logic.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Parameters for one connect attempt.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Remote host.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// Timeout for the connect attempt.
    pub connect_timeout: Duration,
    /// Read timeout applied to the opened channel.
    pub read_timeout: Duration,
}

/// An open, bidirectional byte channel to the middleware.
pub trait Channel: Send {
    /// Read some bytes. A zero return means the peer closed the link.
    /// Must honor the read timeout with `WouldBlock`/`TimedOut`.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all bytes of one frame.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Clone a second handle to the same link (used for the writer half).
    fn try_clone(&self) -> io::Result<Box<dyn Channel>>;

    /// Close the link, unblocking any in-flight read.
    fn shutdown(&self);
}

/// A factory for channels; one implementation per transport kind.
pub trait Transport: Send + Sync {
    /// Open a channel to the middleware.
    fn connect(&self, params: &ConnectParams) -> io::Result<Box<dyn Channel>>;
}

/// The standard stream-socket transport.
#[derive(Debug, Default)]
pub struct TcpTransport;

impl Transport for TcpTransport {
    fn connect(&self, params: &ConnectParams) -> io::Result<Box<dyn Channel>> {
        let addrs = (params.host.as_str(), params.port).to_socket_addrs()?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, params.connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(Some(params.read_timeout))?;
                    return Ok(Box::new(TcpChannel { stream }));
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no address resolved")
        }))
    }
}

struct TcpChannel {
    stream: TcpStream,
}

impl Channel for TcpChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)
    }

    fn try_clone(&self) -> io::Result<Box<dyn Channel>> {
        Ok(Box::new(TcpChannel { stream: self.stream.try_clone()? }))
    }

    fn shutdown(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
