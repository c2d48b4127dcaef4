//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ```text
//! ┌─────────┬─────────┬──────────┬──────────┬──────────┬──────────────────┐
//! │ Ver (1) │ Flg (1) │ Strm (1) │ Op (1)   │ Len (4)  │   Body (Len)     │
//! └─────────┴─────────┴──────────┴──────────┴──────────┴──────────────────┘
//! ```
//!
//! ### Body by Opcode
//! - OPTIONS, READY: empty
//! - STARTUP:   [string map]
//! - QUERY:     [long string] cql + consistency (2)
//! - SUPPORTED: [multi-map]
//! - RESULT:    kind (4) + kind-specific payload
//! - ERROR:     code (4) + [short string] message
//!
//! Bodies are always read as exactly `Len` bytes and parsed from that bounded
//! buffer. A body that needs more than `Len` bytes, or leaves some unparsed,
//! is a protocol violation; the stream never desynchronizes silently.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, Bytes};

use super::frame::{Body, Frame, Header, HEADER_SIZE};
use super::opcode::{Consistency, Opcode, ResultKind};
use super::request::QueryBody;
use super::response::{ErrorBody, ResultBody};
use super::wire;
use crate::error::{CqlError, Result};

/// Maximum body size accepted by default (256 MB)
pub const MAX_BODY_SIZE: u32 = 256 * 1024 * 1024;

// =============================================================================
// Encoding
// =============================================================================

/// Serialize a body on its own
pub fn encode_body(body: &Body) -> Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();

    match body {
        Body::None => {}
        Body::Startup(options) => wire::write_string_map(&mut buf, options)?,
        Body::Query(query) => {
            wire::write_long_string(&mut buf, &query.cql)?;
            wire::write_u16(&mut buf, query.consistency as u16);
        }
        Body::Result(result) => {
            wire::write_u32(&mut buf, result.kind());
            match result {
                ResultBody::Void => {}
                ResultBody::SetKeyspace(keyspace) => wire::write_short_string(&mut buf, keyspace)?,
                ResultBody::Rows(raw)
                | ResultBody::Prepared(raw)
                | ResultBody::SchemaChange(raw)
                | ResultBody::Unknown { raw, .. } => buf.put_slice(raw),
            }
        }
        Body::Supported(options) => wire::write_string_multimap(&mut buf, options)?,
        Body::Error(err) => {
            wire::write_i32(&mut buf, err.code);
            wire::write_short_string(&mut buf, &err.message)?;
        }
    }

    Ok(buf)
}

/// Encode a frame to bytes
///
/// Sets `frame.header.length` to the serialized body length, then emits the
/// header followed by the body.
pub fn encode_frame(frame: &mut Frame) -> Result<Vec<u8>> {
    if !body_fits(frame.header.opcode(), &frame.body) {
        return Err(CqlError::ProtocolViolation(format!(
            "{} body cannot be sent with opcode 0x{:02x}",
            body_name(&frame.body),
            frame.header.opcode
        )));
    }

    let body = encode_body(&frame.body)?;
    let length = u32::try_from(body.len()).map_err(|_| {
        CqlError::ProtocolViolation(format!("body of {} bytes exceeds u32 length", body.len()))
    })?;
    frame.header.length = length;

    let mut message = Vec::with_capacity(HEADER_SIZE + body.len());
    encode_header(&mut message, &frame.header);
    message.extend_from_slice(&body);

    Ok(message)
}

fn encode_header<B: BufMut>(buf: &mut B, header: &Header) {
    buf.put_u8(header.version);
    buf.put_u8(header.flags);
    buf.put_u8(header.stream);
    buf.put_u8(header.opcode);
    buf.put_u32(header.length);
}

fn body_name(body: &Body) -> &'static str {
    match body {
        Body::None => "empty",
        Body::Startup(_) => "STARTUP",
        Body::Query(_) => "QUERY",
        Body::Result(_) => "RESULT",
        Body::Supported(_) => "SUPPORTED",
        Body::Error(_) => "ERROR",
    }
}

/// Whether `body` is the variant `opcode` carries
fn body_fits(opcode: Option<Opcode>, body: &Body) -> bool {
    match body {
        Body::None => !matches!(
            opcode,
            Some(
                Opcode::Startup
                    | Opcode::Query
                    | Opcode::Result
                    | Opcode::Supported
                    | Opcode::Error
            )
        ),
        Body::Startup(_) => opcode == Some(Opcode::Startup),
        Body::Query(_) => opcode == Some(Opcode::Query),
        Body::Result(_) => opcode == Some(Opcode::Result),
        Body::Supported(_) => opcode == Some(Opcode::Supported),
        Body::Error(_) => opcode == Some(Opcode::Error),
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Parse a header from the first [`HEADER_SIZE`] bytes of `bytes`
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    if bytes.len() < HEADER_SIZE {
        return Err(CqlError::TruncatedRead {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let mut buf = &bytes[..HEADER_SIZE];
    Ok(Header {
        version: buf.get_u8(),
        flags: buf.get_u8(),
        stream: buf.get_u8(),
        opcode: buf.get_u8(),
        length: buf.get_u32(),
    })
}

/// Decode a frame from bytes
///
/// Bytes after the end of the frame are ignored.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    let header = decode_header(bytes)?;
    check_body_size(&header, MAX_BODY_SIZE)?;

    let total_len = HEADER_SIZE + header.length as usize;
    if bytes.len() < total_len {
        return Err(CqlError::TruncatedRead {
            needed: total_len,
            available: bytes.len(),
        });
    }

    let body = Bytes::copy_from_slice(&bytes[HEADER_SIZE..total_len]);
    let body = decode_body(&header, body)?;

    Ok(Frame { header, body })
}

fn check_body_size(header: &Header, max_body_size: u32) -> Result<()> {
    if header.length > max_body_size {
        return Err(CqlError::ProtocolViolation(format!(
            "body too large: {} bytes (max {})",
            header.length, max_body_size
        )));
    }
    Ok(())
}

/// Interpret a body buffer of exactly `header.length` bytes
pub fn decode_body(header: &Header, body: Bytes) -> Result<Body> {
    let declared = body.len();
    let mut buf = body;

    let parsed = parse_body(header, &mut buf).map_err(|e| match e {
        CqlError::TruncatedRead { .. } => CqlError::ProtocolViolation(format!(
            "opcode 0x{:02x} body overruns its declared length of {} bytes",
            header.opcode, declared
        )),
        other => other,
    })?;

    if buf.has_remaining() {
        return Err(CqlError::ProtocolViolation(format!(
            "opcode 0x{:02x} body declared {} bytes, {} left unparsed",
            header.opcode,
            declared,
            buf.remaining()
        )));
    }

    Ok(parsed)
}

fn parse_body(header: &Header, buf: &mut Bytes) -> Result<Body> {
    let opcode = match header.opcode() {
        Some(op) => op,
        None => {
            // Unknown opcode: keep the header, drop the body
            buf.advance(buf.remaining());
            return Ok(Body::None);
        }
    };

    let body = match opcode {
        Opcode::Result => Body::Result(parse_result(buf)?),
        Opcode::Error => {
            let code = wire::read_i32(buf)?;
            let message = wire::read_short_string(buf)?;
            Body::Error(ErrorBody { code, message })
        }
        Opcode::Supported => Body::Supported(wire::read_string_multimap(buf)?),
        Opcode::Startup => Body::Startup(wire::read_string_map(buf)?),
        Opcode::Query => {
            let cql = wire::read_long_string(buf)?;
            let code = wire::read_u16(buf)?;
            let consistency = Consistency::from_u16(code).ok_or_else(|| {
                CqlError::ProtocolViolation(format!("unknown consistency 0x{:04x}", code))
            })?;
            Body::Query(QueryBody { cql, consistency })
        }
        // No body on the wire; leftovers are reported by the caller
        Opcode::Ready | Opcode::Options => Body::None,
        Opcode::Authenticate
        | Opcode::Credentials
        | Opcode::Prepare
        | Opcode::Execute
        | Opcode::Register
        | Opcode::Event => {
            buf.advance(buf.remaining());
            Body::None
        }
    };

    Ok(body)
}

fn parse_result(buf: &mut Bytes) -> Result<ResultBody> {
    let kind = wire::read_u32(buf)?;

    let result = match ResultKind::from_u32(kind) {
        Some(ResultKind::Void) => ResultBody::Void,
        Some(ResultKind::SetKeyspace) => ResultBody::SetKeyspace(wire::read_short_string(buf)?),
        Some(ResultKind::Rows) => ResultBody::Rows(rest(buf)),
        Some(ResultKind::Prepared) => ResultBody::Prepared(rest(buf)),
        Some(ResultKind::SchemaChange) => ResultBody::SchemaChange(rest(buf)),
        None => ResultBody::Unknown {
            kind,
            raw: rest(buf),
        },
    };

    Ok(result)
}

/// Unmodeled payloads are kept whole
fn rest(buf: &mut Bytes) -> Bytes {
    let len = buf.len();
    buf.split_to(len)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Fill `buf` as far as the reader allows; returns the number of bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Read a complete frame from a stream
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame> {
    read_frame_with_limit(reader, MAX_BODY_SIZE)
}

/// Read a complete frame, rejecting bodies larger than `max_body_size`
pub fn read_frame_with_limit<R: Read>(reader: &mut R, max_body_size: u32) -> Result<Frame> {
    // Read header first
    let mut header_bytes = [0u8; HEADER_SIZE];
    let got = read_full(reader, &mut header_bytes)?;
    let header = decode_header(&header_bytes[..got])?;

    check_body_size(&header, max_body_size)?;

    // Read body
    let length = header.length as usize;
    let mut body = vec![0u8; length];
    if length > 0 {
        let got = read_full(reader, &mut body)?;
        if got < length {
            return Err(CqlError::TruncatedRead {
                needed: length,
                available: got,
            });
        }
    }

    let body = decode_body(&header, Bytes::from(body))?;
    Ok(Frame { header, body })
}

/// Write a frame to a stream
pub fn write_frame<W: Write>(writer: &mut W, frame: &mut Frame) -> Result<()> {
    let bytes = encode_frame(frame)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
