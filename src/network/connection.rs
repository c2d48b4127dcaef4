//! Client Connection
//!
//! Drives the startup handshake and runs queries over one transport.
//!
//! ## Handshake
//! ```text
//! Disconnected ──OPTIONS──▶ AwaitingSupported ──STARTUP──▶ AwaitingReady ──▶ Ready ──▶ Closed
//!        └──────────────────────────┴─────────────────────────┴──(error)──▶ Failed
//! ```
//!
//! One request is in flight at a time and every frame uses stream id 0.
//! Responses are correlated by order alone, so the connection must not be
//! used for pipelining.

use std::fmt;
use std::io::BufReader;
use std::net::TcpStream;

use crate::config::ConnectionConfig;
use crate::error::{CqlError, Result};
use crate::network::transport::{connect_tcp, Transport};
use crate::protocol::{
    options_request, query_request, read_frame_with_limit, startup_request, write_frame, Body,
    Consistency, Frame, Opcode, ResultBody, StringMap, StringMultiMap, CQL_VERSION,
};

/// Stream id carried by every request
const STREAM_ID: u8 = 0;

/// Lifecycle of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    AwaitingSupported,
    AwaitingReady,
    Ready,
    Closed,
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::AwaitingSupported => "awaiting SUPPORTED",
            ConnectionState::AwaitingReady => "awaiting READY",
            ConnectionState::Ready => "ready",
            ConnectionState::Closed => "closed",
            ConnectionState::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client connection that has completed the handshake
pub struct Connection<T: Transport = TcpStream> {
    /// Transport, buffered for reads; writes go through `get_mut`
    transport: BufReader<T>,

    config: ConnectionConfig,

    state: ConnectionState,

    /// Options the server advertised in SUPPORTED
    supported: StringMultiMap,

    /// Peer address for logging
    peer: String,
}

impl Connection<TcpStream> {
    /// Dial `config.address` and run the handshake
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let stream = connect_tcp(config)?;
        Self::handshake(stream, config)
    }
}

impl<T: Transport> Connection<T> {
    /// Run the handshake over an open transport
    ///
    /// Returns a connection in the `Ready` state. On failure the transport
    /// is dropped.
    pub fn handshake(transport: T, config: &ConnectionConfig) -> Result<Self> {
        let peer = transport.peer();
        let mut conn = Self {
            transport: BufReader::new(transport),
            config: config.clone(),
            state: ConnectionState::Disconnected,
            supported: StringMultiMap::new(),
            peer,
        };

        if let Err(e) = conn.negotiate() {
            tracing::warn!(
                "Handshake with {} failed while {}: {}",
                conn.peer,
                conn.state,
                e
            );
            conn.transition(ConnectionState::Failed);
            return Err(e);
        }

        Ok(conn)
    }

    fn negotiate(&mut self) -> Result<()> {
        // Disconnected -> AwaitingSupported
        self.send(options_request(self.next_stream()))?;
        self.transition(ConnectionState::AwaitingSupported);

        // AwaitingSupported -> AwaitingReady
        let frame = self.recv()?.into_result()?;
        self.supported = match frame.body {
            Body::Supported(options) if frame.header.opcode == Opcode::Supported as u8 => options,
            _ => {
                return Err(CqlError::UnexpectedOpcode {
                    expected: Opcode::Supported,
                    got: frame.header.opcode,
                })
            }
        };
        tracing::debug!(
            "Remote peer {} supports following options {:?}",
            self.peer,
            self.supported
        );

        let startup = self.startup_options();
        self.send(startup_request(self.next_stream(), startup))?;
        self.transition(ConnectionState::AwaitingReady);

        // AwaitingReady -> Ready
        let frame = self.recv()?.into_result()?;
        if frame.header.opcode != Opcode::Ready as u8 {
            return Err(CqlError::UnexpectedOpcode {
                expected: Opcode::Ready,
                got: frame.header.opcode,
            });
        }

        self.transition(ConnectionState::Ready);
        Ok(())
    }

    /// STARTUP options: the configured CQL_VERSION and nothing else
    fn startup_options(&self) -> StringMap {
        let version = &self.config.cql_version;
        if let Some(advertised) = self.supported.get(CQL_VERSION) {
            if !advertised.iter().any(|v| v == version) {
                tracing::warn!(
                    "Requesting CQL_VERSION {} which {} does not advertise ({:?})",
                    version,
                    self.peer,
                    advertised
                );
            }
        }

        let mut options = StringMap::new();
        options.insert(CQL_VERSION.to_string(), version.clone());
        options
    }

    /// Run a statement at consistency ANY
    ///
    /// Returns the new keyspace name for `USE` statements. Every other
    /// result kind is reported as [`CqlError::UnsupportedResult`].
    pub fn query(&mut self, cql: &str) -> Result<String> {
        self.query_with_consistency(cql, Consistency::Any)
    }

    /// Run a statement at the given consistency
    pub fn query_with_consistency(&mut self, cql: &str, consistency: Consistency) -> Result<String> {
        if self.state != ConnectionState::Ready {
            return Err(CqlError::InvalidState {
                state: self.state.as_str(),
                operation: "query",
            });
        }

        let result = self.execute(cql, consistency);
        if let Err(ref e) = result {
            if e.is_fatal() {
                tracing::warn!("Query on {} failed, dropping connection: {}", self.peer, e);
                self.transition(ConnectionState::Failed);
            } else {
                tracing::debug!("Query on {} failed: {}", self.peer, e);
            }
        }
        result
    }

    fn execute(&mut self, cql: &str, consistency: Consistency) -> Result<String> {
        tracing::trace!("Query on {} at {}: {}", self.peer, consistency, cql);
        self.send(query_request(self.next_stream(), cql, consistency))?;

        let frame = self.recv()?.into_result()?;
        match frame.body {
            Body::Result(ResultBody::SetKeyspace(keyspace)) => Ok(keyspace),
            Body::Result(other) => Err(CqlError::UnsupportedResult { kind: other.kind() }),
            _ => Err(CqlError::UnexpectedOpcode {
                expected: Opcode::Result,
                got: frame.header.opcode,
            }),
        }
    }

    /// Release the transport
    ///
    /// Closing an already closed connection hands back whatever the
    /// transport reports.
    pub fn close(&mut self) -> Result<()> {
        self.transition(ConnectionState::Closed);
        self.transport.get_mut().close()?;
        tracing::debug!("Connection to {} closed", self.peer);
        Ok(())
    }

    /// Stream id for the next request. Always 0: one request in flight.
    fn next_stream(&self) -> u8 {
        STREAM_ID
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            tracing::debug!("Connection to {}: {} -> {}", self.peer, self.state, next);
            self.state = next;
        }
    }

    fn send(&mut self, mut frame: Frame) -> Result<()> {
        write_frame(self.transport.get_mut(), &mut frame)?;
        tracing::trace!(
            "Sent opcode 0x{:02x} stream {} ({} bytes) to {}",
            frame.header.opcode,
            frame.header.stream,
            frame.header.length,
            self.peer
        );
        Ok(())
    }

    fn recv(&mut self) -> Result<Frame> {
        let frame = read_frame_with_limit(&mut self.transport, self.config.max_body_size)?;
        tracing::trace!(
            "Received opcode 0x{:02x} stream {} ({} bytes) from {}",
            frame.header.opcode,
            frame.header.stream,
            frame.header.length,
            self.peer
        );
        Ok(frame)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Options the server advertised during the handshake
    pub fn supported(&self) -> &StringMultiMap {
        &self.supported
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        self.transport.get_ref()
    }
}
