//! Network Module
//!
//! Client connections over a blocking byte stream.
//!
//! ## Architecture
//! - `Transport`: exclusively owned stream (TCP in production)
//! - `Connection`: handshake state machine + synchronous queries
//! - `SharedConnection`: mutex-serialized access from several threads

mod connection;
mod shared;
mod transport;

pub use connection::{Connection, ConnectionState};
pub use shared::SharedConnection;
pub use transport::{connect_tcp, Transport};
