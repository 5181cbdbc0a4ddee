//! Line transport to the ds-server.
//!
//! [`TcpTransport`] writes whole lines and flushes immediately; the server
//! blocks until it sees the newline, so nothing may sit in a buffer.

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{ProtocolError, ProtocolResult};

/// A bidirectional, newline-framed byte stream.
pub trait Transport: Send + std::fmt::Debug {
    /// Write `line` (already newline-terminated) and flush.
    fn write_line(&mut self, line: &str) -> std::io::Result<()>;

    /// Read one line without its terminator. `None` if the peer closed the
    /// stream before a full line arrived.
    fn read_line(&mut self) -> std::io::Result<Option<String>>;

    fn close(&mut self) -> std::io::Result<()>;
}

/// Plain TCP transport.
pub struct TcpTransport {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("peer", &self.writer.peer_addr().ok())
            .finish()
    }
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> std::io::Result<Self> {
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }

    /// Resolve `host:port` and connect, applying both timeouts.
    ///
    /// `read_timeout = None` blocks indefinitely on reads.
    pub fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        read_timeout: Option<Duration>,
    ) -> ProtocolResult<Self> {
        let addr_str = format!("{host}:{port}");
        let connect_err = |source| ProtocolError::Connect {
            addr: addr_str.clone(),
            source,
        };

        let addr = addr_str
            .to_socket_addrs()
            .map_err(connect_err)?
            .next()
            .ok_or_else(|| {
                connect_err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no address found",
                ))
            })?;

        let stream = TcpStream::connect_timeout(&addr, connect_timeout).map_err(connect_err)?;
        stream.set_read_timeout(read_timeout)?;

        // Every exchange is a single short line; Nagle only adds latency.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%addr, error = %e, "could not disable Nagle");
        }

        tracing::debug!(%addr, ?read_timeout, "established tcp connection");
        Ok(Self::new(stream)?)
    }
}

impl Transport for TcpTransport {
    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()
    }

    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut buf = String::new();
        let n = self.reader.read_line(&mut buf)?;
        if n == 0 || !buf.ends_with('\n') {
            return Ok(None);
        }
        let trimmed = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed);
        Ok(Some(buf))
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.writer.flush()?;
        self.writer.shutdown(Shutdown::Both)
    }
}
