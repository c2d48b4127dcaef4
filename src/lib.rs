//! # cqlink
//!
//! A minimal blocking client for the Cassandra CQL native binary protocol:
//! - Frame codec (8-byte header + opcode-tagged body)
//! - Startup handshake (OPTIONS -> SUPPORTED -> STARTUP -> READY)
//! - Synchronous queries, one request in flight per connection
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Connection                              │
//! │          (handshake state machine, query)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ typed frames
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Frame Codec                               │
//! │        (header, opcode dispatch, bounded bodies)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Wire Primitives                             │
//! │     (big-endian ints, strings, maps, multi-maps)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ bytes
//!                       ▼
//!                  Transport (TCP)
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CqlError, Result};
pub use config::ConnectionConfig;
pub use network::{Connection, ConnectionState, SharedConnection};
pub use protocol::Consistency;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of cqlink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
