//! Configuration for cqlink
//!
//! Centralized connection configuration with sensible defaults.

use std::time::Duration;

use crate::protocol::MAX_BODY_SIZE;

/// Port used when the address carries none
pub const DEFAULT_PORT: u16 = 9042;

/// CQL dialect requested in STARTUP
pub const DEFAULT_CQL_VERSION: &str = "3.0.0";

/// Configuration for a single connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Server address, `host` or `host:port`
    pub address: String,

    /// Upper bound on the TCP dial
    pub connect_timeout: Duration,

    /// Socket read timeout; `None` blocks until the peer answers
    pub recv_timeout: Option<Duration>,

    /// Socket write timeout
    pub write_timeout: Option<Duration>,

    /// Keep-alive interval. Carried as configuration; no pings are sent.
    pub keep_alive_interval: Duration,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// CQL_VERSION sent in STARTUP. Fixed, not negotiated.
    pub cql_version: String,

    /// Frames declaring a larger body are rejected before allocation
    pub max_body_size: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            connect_timeout: Duration::from_secs(1),
            recv_timeout: Some(Duration::from_secs(1)),
            write_timeout: Some(Duration::from_secs(1)),
            keep_alive_interval: Duration::from_secs(10),
            cql_version: DEFAULT_CQL_VERSION.to_string(),
            max_body_size: MAX_BODY_SIZE,
        }
    }
}

impl ConnectionConfig {
    /// Create a new config builder
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// The address with [`DEFAULT_PORT`] appended when no port is given
    pub fn socket_address(&self) -> String {
        let addr = self.address.trim();
        let has_port = if let Some(rest) = addr.strip_prefix('[') {
            // [v6]:port
            rest.split_once(']')
                .map(|(_, tail)| tail.starts_with(':'))
                .unwrap_or(false)
        } else {
            // A bare IPv6 literal has several colons and no port
            addr.matches(':').count() == 1
        };

        if has_port {
            addr.to_string()
        } else if addr.contains(':') && !addr.starts_with('[') {
            format!("[{}]:{}", addr, DEFAULT_PORT)
        } else {
            format!("{}:{}", addr, DEFAULT_PORT)
        }
    }
}

/// Builder for ConnectionConfig
#[derive(Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Set the server address (`host` or `host:port`)
    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.config.address = addr.into();
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the receive timeout (`None` to block indefinitely)
    pub fn recv_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.recv_timeout = timeout;
        self
    }

    /// Set the write timeout (`None` to block indefinitely)
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    pub fn keep_alive_interval(mut self, interval: Duration) -> Self {
        self.config.keep_alive_interval = interval;
        self
    }

    /// Set the CQL_VERSION requested in STARTUP
    pub fn cql_version(mut self, version: impl Into<String>) -> Self {
        self.config.cql_version = version.into();
        self
    }

    /// Set the largest accepted response body (in bytes)
    pub fn max_body_size(mut self, bytes: u32) -> Self {
        self.config.max_body_size = bytes;
        self
    }

    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}
