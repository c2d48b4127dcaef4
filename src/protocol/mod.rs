//! Protocol Module
//!
//! Wire codec for the CQL native binary protocol (v1 framing).
//!
//! ## Frame Format
//! ```text
//! ┌─────────┬─────────┬──────────┬──────────┬──────────┬──────────────────┐
//! │ Ver (1) │ Flg (1) │ Strm (1) │ Op (1)   │ Len (4)  │   Body (Len)     │
//! └─────────┴─────────┴──────────┴──────────┴──────────┴──────────────────┘
//! ```
//!
//! ### Version
//! - 0x01: request (client -> server)
//! - 0x81: response (server -> client)
//!
//! ### Opcodes used by the client
//! - 0x05: OPTIONS   -> 0x06: SUPPORTED
//! - 0x01: STARTUP   -> 0x02: READY
//! - 0x07: QUERY     -> 0x08: RESULT
//! - any request     -> 0x00: ERROR

mod codec;
mod frame;
mod opcode;
mod request;
mod response;
pub mod wire;

pub use codec::{
    decode_body, decode_frame, decode_header, encode_body, encode_frame, read_frame,
    read_frame_with_limit, write_frame, MAX_BODY_SIZE,
};
pub use frame::{Body, Frame, Header, HEADER_SIZE};
pub use opcode::{
    Consistency, Opcode, ResultKind, COMPRESSION, NO_FLAGS, REQUEST, RESPONSE, TRACING,
};
pub use request::{options_request, query_request, startup_request, QueryBody, CQL_VERSION};
pub use response::{ErrorBody, ResultBody};
pub use wire::{StringMap, StringMultiMap};
