//! Transport
//!
//! The byte stream a connection runs over.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use crate::config::ConnectionConfig;
use crate::error::{CqlError, Result};

/// A blocking, exclusively owned byte stream
pub trait Transport: Read + Write {
    /// Release the stream. Closing twice reports the second failure as-is.
    fn close(&mut self) -> io::Result<()>;

    /// Peer description for logging
    fn peer(&self) -> String {
        "unknown".to_string()
    }
}

impl Transport for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }

    fn peer(&self) -> String {
        self.peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

/// Dial the configured address within `connect_timeout` and apply socket timeouts
///
/// Every resolved address is tried in turn; the last error is returned if
/// none accepts.
pub fn connect_tcp(config: &ConnectionConfig) -> Result<TcpStream> {
    let target = config.socket_address();
    let addrs = target
        .to_socket_addrs()
        .map_err(|e| CqlError::Config(format!("cannot resolve {}: {}", target, e)))?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, config.connect_timeout) {
            Ok(stream) => {
                // Disable Nagle's algorithm for low latency
                stream.set_nodelay(true)?;
                stream.set_read_timeout(config.recv_timeout)?;
                stream.set_write_timeout(config.write_timeout)?;
                tracing::debug!("Connected to {}", addr);
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    match last_err {
        Some(e) => Err(CqlError::Io(e)),
        None => Err(CqlError::Config(format!(
            "{} resolved to no addresses",
            target
        ))),
    }
}
