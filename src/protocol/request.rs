//! Request definitions
//!
//! Builders for the frames a client sends. They only assemble fields;
//! the body length is filled in by the codec.

use super::frame::{Body, Frame, Header};
use super::opcode::{Consistency, Opcode, NO_FLAGS, REQUEST};
use super::wire::StringMap;

/// Startup option naming the CQL dialect
pub const CQL_VERSION: &str = "CQL_VERSION";

/// Body of a QUERY request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBody {
    /// Query text, sent as a long string
    pub cql: String,
    pub consistency: Consistency,
}

impl QueryBody {
    pub fn new(cql: impl Into<String>, consistency: Consistency) -> Self {
        Self {
            cql: cql.into(),
            consistency,
        }
    }
}

fn request_header(stream: u8, opcode: Opcode) -> Header {
    Header::new(REQUEST, NO_FLAGS, stream, opcode)
}

/// OPTIONS: asks the server what it supports. Header only.
pub fn options_request(stream: u8) -> Frame {
    Frame::new(request_header(stream, Opcode::Options), Body::None)
}

/// STARTUP: opens the session with the chosen options
pub fn startup_request(stream: u8, options: StringMap) -> Frame {
    Frame::new(request_header(stream, Opcode::Startup), Body::Startup(options))
}

/// QUERY: runs one CQL statement
pub fn query_request(stream: u8, cql: impl Into<String>, consistency: Consistency) -> Frame {
    Frame::new(
        request_header(stream, Opcode::Query),
        Body::Query(QueryBody::new(cql, consistency)),
    )
}
