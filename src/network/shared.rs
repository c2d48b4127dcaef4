//! Shared Connection
//!
//! Lets several threads use one connection by taking turns. Each call holds
//! the lock for a full request/response round trip, so requests are still
//! strictly sequential on the wire.

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::network::connection::{Connection, ConnectionState};
use crate::network::transport::Transport;
use crate::protocol::Consistency;

/// Cloneable handle to a mutex-guarded [`Connection`]
pub struct SharedConnection<T: Transport = TcpStream> {
    inner: Arc<Mutex<Connection<T>>>,
}

impl<T: Transport> Clone for SharedConnection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> SharedConnection<T> {
    pub fn new(connection: Connection<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(connection)),
        }
    }

    pub fn query(&self, cql: &str) -> Result<String> {
        self.inner.lock().query(cql)
    }

    pub fn query_with_consistency(&self, cql: &str, consistency: Consistency) -> Result<String> {
        self.inner.lock().query_with_consistency(cql, consistency)
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state()
    }

    pub fn close(&self) -> Result<()> {
        self.inner.lock().close()
    }
}

impl<T: Transport> From<Connection<T>> for SharedConnection<T> {
    fn from(connection: Connection<T>) -> Self {
        Self::new(connection)
    }
}
