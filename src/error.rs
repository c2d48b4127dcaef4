//! Error types for cqlink
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::protocol::{Opcode, ResultKind};

/// Result type alias using CqlError
pub type Result<T> = std::result::Result<T, CqlError>;

/// Unified error type for cqlink operations
#[derive(Debug, Error)]
pub enum CqlError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// Connect/read/write/close failure on the byte stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Decoding Errors
    // -------------------------------------------------------------------------
    /// The byte source ran out before a field was complete
    #[error("Truncated read: needed {needed} bytes, {available} available")]
    TruncatedRead { needed: usize, available: usize },

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    #[error("String too long: {len} bytes (max {max})")]
    StringTooLong { len: usize, max: usize },

    #[error("Collection too large: {len} entries (max {max})")]
    CollectionTooLarge { len: usize, max: usize },

    // -------------------------------------------------------------------------
    // Peer Errors
    // -------------------------------------------------------------------------
    /// The peer answered with an ERROR frame
    #[error("Error from remote peer: code = {code}; message = {message}")]
    Remote { code: i32, message: String },

    #[error("Expected {expected} opcode but received {}", opcode_name(.got))]
    UnexpectedOpcode { expected: Opcode, got: u8 },

    /// A successful RESULT whose kind this client does not interpret
    #[error("Unsupported result kind: {}", result_kind_name(.kind))]
    UnsupportedResult { kind: u32 },

    // -------------------------------------------------------------------------
    // Usage Errors
    // -------------------------------------------------------------------------
    #[error("Cannot {operation} while connection is {state}")]
    InvalidState {
        state: &'static str,
        operation: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CqlError {
    /// Returns true if the connection that produced this error must be discarded.
    ///
    /// `Remote` and `UnsupportedResult` are answers to a single request; the
    /// stream is still in sync after them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CqlError::Io(_)
                | CqlError::TruncatedRead { .. }
                | CqlError::ProtocolViolation(_)
                | CqlError::UnexpectedOpcode { .. }
        )
    }

    /// Returns true if this error means the byte source was exhausted.
    pub fn is_truncated(&self) -> bool {
        matches!(self, CqlError::TruncatedRead { .. })
    }
}

fn opcode_name(code: &u8) -> String {
    match Opcode::from_u8(*code) {
        Some(op) => op.to_string(),
        None => format!("0x{:02x}", code),
    }
}

fn result_kind_name(kind: &u32) -> String {
    match ResultKind::from_u32(*kind) {
        Some(k) => k.to_string(),
        None => format!("0x{:04x}", kind),
    }
}
