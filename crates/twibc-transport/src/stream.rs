use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TransportError};

/// Socket path twibd binds by default on Unix systems.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/twibd.sock";

/// TCP port twibd's remote frontend listens on by default.
pub const DEFAULT_TCP_PORT: u16 = 15151;

/// A connected stream to twibd — implements Read + Write.
///
/// This is the fundamental I/O type consumed by the connection layer.
/// It wraps either a Unix domain socket or a TCP stream.
pub struct BridgeStream {
    inner: BridgeStreamInner,
}

enum BridgeStreamInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
    Tcp(TcpStream),
}

impl Read for BridgeStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            BridgeStreamInner::Unix(stream) => stream.read(buf),
            BridgeStreamInner::Tcp(stream) => stream.read(buf),
        }
    }
}

impl Write for BridgeStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            BridgeStreamInner::Unix(stream) => stream.write(buf),
            BridgeStreamInner::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            BridgeStreamInner::Unix(stream) => stream.flush(),
            BridgeStreamInner::Tcp(stream) => stream.flush(),
        }
    }
}

impl BridgeStream {
    /// Connect to twibd over its Unix domain socket (blocking).
    #[cfg(unix)]
    pub fn connect_unix(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream =
            std::os::unix::net::UnixStream::connect(path).map_err(|e| TransportError::Connect {
                path: path.to_path_buf(),
                source: e,
            })?;
        debug!(?path, "connected to twibd over unix domain socket");
        Ok(Self {
            inner: BridgeStreamInner::Unix(stream),
        })
    }

    /// Connect to twibd's TCP frontend (blocking).
    pub fn connect_tcp(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let stream = TcpStream::connect(&addr).map_err(|e| TransportError::ConnectTcp {
            addr: addr.to_string(),
            source: e,
        })?;
        debug!(%addr, "connected to twibd over tcp");
        Ok(Self {
            inner: BridgeStreamInner::Tcp(stream),
        })
    }

    /// Create a connected pair of streams, useful for loopback testing a
    /// client against an in-process fake daemon.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (a, b) = std::os::unix::net::UnixStream::pair()?;
        Ok((
            Self {
                inner: BridgeStreamInner::Unix(a),
            },
            Self {
                inner: BridgeStreamInner::Unix(b),
            },
        ))
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            BridgeStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            BridgeStreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            BridgeStreamInner::Unix(stream) => {
                stream.set_write_timeout(timeout).map_err(Into::into)
            }
            BridgeStreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// The connection layer clones once so its reader thread and its send
    /// path hold independent handles to the same socket.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            BridgeStreamInner::Unix(stream) => Ok(Self {
                inner: BridgeStreamInner::Unix(stream.try_clone()?),
            }),
            BridgeStreamInner::Tcp(stream) => Ok(Self {
                inner: BridgeStreamInner::Tcp(stream.try_clone()?),
            }),
        }
    }

    /// Shut down both directions of the stream.
    ///
    /// Unblocks any thread currently blocked reading from a clone of this
    /// stream; its read returns EOF or an error.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            BridgeStreamInner::Unix(stream) => stream.shutdown(Shutdown::Both).map_err(Into::into),
            BridgeStreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both).map_err(Into::into),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            #[cfg(unix)]
            BridgeStreamInner::Unix(_) => "unix-domain-socket",
            BridgeStreamInner::Tcp(_) => "tcp",
        }
    }
}

impl std::fmt::Debug for BridgeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeStream")
            .field("type", &self.transport_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn pair_is_connected_both_ways() {
        let (mut a, mut b) = BridgeStream::pair().unwrap();

        a.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        b.write_all(b"pong").unwrap();
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"pong");
    }

    #[test]
    #[cfg(unix)]
    fn try_clone_shares_the_socket() {
        let (mut a, b) = BridgeStream::pair().unwrap();
        let mut b_clone = b.try_clone().unwrap();

        a.write_all(b"x").unwrap();
        let mut buf = [0u8; 1];
        b_clone.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"x");
    }

    #[test]
    #[cfg(unix)]
    fn shutdown_unblocks_reader_clone() {
        let (a, b) = BridgeStream::pair().unwrap();
        let mut b_reader = b.try_clone().unwrap();

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 1];
            b_reader.read(&mut buf)
        });

        drop(a);
        b.shutdown().unwrap();
        let read = handle.join().unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));
    }

    #[test]
    fn connect_tcp_refused_reports_addr() {
        // Port 1 on localhost is essentially never listening.
        let err = BridgeStream::connect_tcp("127.0.0.1:1").unwrap_err();
        assert!(matches!(err, TransportError::ConnectTcp { .. }));
    }
}
