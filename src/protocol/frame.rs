//! Frame definitions
//!
//! A frame is a fixed 8-byte header followed by an opcode-tagged body.

use super::opcode::{Opcode, RESPONSE};
use super::request::QueryBody;
use super::response::{ErrorBody, ResultBody};
use super::wire::{StringMap, StringMultiMap};
use crate::error::{CqlError, Result};

/// Header size: version (1) + flags (1) + stream (1) + opcode (1) + length (4)
pub const HEADER_SIZE: usize = 8;

/// Fixed-size frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub flags: u8,
    pub stream: u8,
    /// Raw opcode byte; unknown values are kept so the header still decodes
    pub opcode: u8,
    /// Serialized body length in bytes
    pub length: u32,
}

impl Header {
    pub fn new(version: u8, flags: u8, stream: u8, opcode: Opcode) -> Self {
        Self {
            version,
            flags,
            stream,
            opcode: opcode as u8,
            length: 0,
        }
    }

    /// The opcode, if this client knows it
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode)
    }

    /// True for frames travelling server -> client
    pub fn is_response(&self) -> bool {
        self.version & RESPONSE == RESPONSE
    }
}

/// Opcode-specific body of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// OPTIONS, READY, and opcodes this client does not model
    None,

    /// STARTUP options
    Startup(StringMap),

    /// QUERY request
    Query(QueryBody),

    /// RESULT response
    Result(ResultBody),

    /// SUPPORTED response: option name -> accepted values
    Supported(StringMultiMap),

    /// ERROR response
    Error(ErrorBody),
}

/// One complete protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: Header,
    pub body: Body,
}

impl Frame {
    pub fn new(header: Header, body: Body) -> Self {
        Self { header, body }
    }

    pub fn opcode(&self) -> Option<Opcode> {
        self.header.opcode()
    }

    pub fn stream(&self) -> u8 {
        self.header.stream
    }

    /// Turn an ERROR frame into [`CqlError::Remote`], pass anything else through.
    pub fn into_result(self) -> Result<Frame> {
        match self.body {
            Body::Error(err) => Err(CqlError::Remote {
                code: err.code,
                message: err.message,
            }),
            _ => Ok(self),
        }
    }
}
