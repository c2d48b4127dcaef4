//! Response definitions
//!
//! Typed payloads of RESULT and ERROR frames.

use bytes::Bytes;

use super::opcode::ResultKind;

/// Payload of a RESULT frame, selected by its kind tag
///
/// Only SET_KEYSPACE is interpreted. The other kinds keep their payload
/// as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultBody {
    Void,
    Rows(Bytes),
    SetKeyspace(String),
    Prepared(Bytes),
    SchemaChange(Bytes),
    /// A kind tag outside the catalog
    Unknown { kind: u32, raw: Bytes },
}

impl ResultBody {
    /// Numeric kind tag as it appears on the wire
    pub fn kind(&self) -> u32 {
        match self {
            ResultBody::Void => ResultKind::Void as u32,
            ResultBody::Rows(_) => ResultKind::Rows as u32,
            ResultBody::SetKeyspace(_) => ResultKind::SetKeyspace as u32,
            ResultBody::Prepared(_) => ResultKind::Prepared as u32,
            ResultBody::SchemaChange(_) => ResultKind::SchemaChange as u32,
            ResultBody::Unknown { kind, .. } => *kind,
        }
    }
}

/// Payload of an ERROR frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
