//! Tests for Connection
//!
//! These tests verify:
//! - The OPTIONS -> SUPPORTED -> STARTUP -> READY handshake
//! - Handshake failures (ERROR replies, wrong opcodes, short reads)
//! - Query results and which failures keep the connection usable
//! - Close semantics
//! - Serialized access through SharedConnection

use std::io::{self, Cursor, Read, Write};
use std::thread;

use cqlink::network::{Connection, ConnectionState, SharedConnection, Transport};
use cqlink::protocol::{
    encode_frame, read_frame, Body, Consistency, ErrorBody, Frame, Header, Opcode, QueryBody,
    ResultBody, StringMap, StringMultiMap, NO_FLAGS, REQUEST, RESPONSE,
};
use cqlink::{ConnectionConfig, CqlError};

// =============================================================================
// Scripted Transport
// =============================================================================

/// In-memory transport: reads come from a prepared script, writes are recorded
struct ScriptedTransport {
    script: Cursor<Vec<u8>>,
    written: Vec<u8>,
    closed: bool,
}

impl ScriptedTransport {
    fn new(script: Vec<u8>) -> Self {
        Self {
            script: Cursor::new(script),
            written: Vec::new(),
            closed: false,
        }
    }

    /// Every frame the client sent, in order
    fn sent_frames(&self) -> Vec<Frame> {
        let mut cursor = Cursor::new(self.written.clone());
        let mut frames = Vec::new();
        while (cursor.position() as usize) < self.written.len() {
            frames.push(read_frame(&mut cursor).unwrap());
        }
        frames
    }
}

impl Read for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.script.read(buf)
    }
}

impl Write for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        }
        self.written.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for ScriptedTransport {
    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "already closed"));
        }
        self.closed = true;
        Ok(())
    }

    fn peer(&self) -> String {
        "scripted".to_string()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn reply(opcode: Opcode, body: Body) -> Vec<u8> {
    let mut frame = Frame::new(Header::new(RESPONSE, NO_FLAGS, 0, opcode), body);
    encode_frame(&mut frame).unwrap()
}

fn supported(versions: &[&str]) -> Vec<u8> {
    let mut options = StringMultiMap::new();
    options.insert(
        "CQL_VERSION".to_string(),
        versions.iter().map(|v| v.to_string()).collect(),
    );
    options.insert("COMPRESSION".to_string(), vec!["snappy".to_string()]);
    reply(Opcode::Supported, Body::Supported(options))
}

fn ready() -> Vec<u8> {
    reply(Opcode::Ready, Body::None)
}

fn set_keyspace(name: &str) -> Vec<u8> {
    reply(
        Opcode::Result,
        Body::Result(ResultBody::SetKeyspace(name.to_string())),
    )
}

fn error(code: i32, message: &str) -> Vec<u8> {
    reply(Opcode::Error, Body::Error(ErrorBody::new(code, message)))
}

fn script(parts: &[Vec<u8>]) -> ScriptedTransport {
    ScriptedTransport::new(parts.concat())
}

fn handshake_script(extra: &[Vec<u8>]) -> ScriptedTransport {
    let mut parts = vec![supported(&["3.0.0", "3.1.0"]), ready()];
    parts.extend_from_slice(extra);
    script(&parts)
}

fn connect(extra: &[Vec<u8>]) -> Connection<ScriptedTransport> {
    Connection::handshake(handshake_script(extra), &ConnectionConfig::default()).unwrap()
}

// =============================================================================
// Handshake Tests
// =============================================================================

#[test]
fn test_handshake_reaches_ready() {
    let conn = connect(&[]);

    assert_eq!(conn.state(), ConnectionState::Ready);
    assert_eq!(
        conn.supported()["CQL_VERSION"],
        vec!["3.0.0".to_string(), "3.1.0".to_string()]
    );
    assert_eq!(conn.peer(), "scripted");

    let sent = conn.transport().sent_frames();
    assert_eq!(sent.len(), 2);

    // OPTIONS: header only
    assert_eq!(sent[0].opcode(), Some(Opcode::Options));
    assert_eq!(sent[0].header.length, 0);
    assert_eq!(sent[0].body, Body::None);

    // STARTUP: CQL_VERSION=3.0.0 is the only option
    let mut expected = StringMap::new();
    expected.insert("CQL_VERSION".to_string(), "3.0.0".to_string());
    assert_eq!(sent[1].opcode(), Some(Opcode::Startup));
    assert_eq!(sent[1].body, Body::Startup(expected));

    for frame in &sent {
        assert_eq!(frame.header.version, REQUEST);
        assert_eq!(frame.header.flags, NO_FLAGS);
        assert_eq!(frame.header.stream, 0);
    }
}

#[test]
fn test_handshake_uses_configured_version_even_if_not_advertised() {
    let transport = script(&[supported(&["3.4.0"]), ready()]);
    let config = ConnectionConfig::builder().cql_version("3.0.0").build();
    let conn = Connection::handshake(transport, &config).unwrap();

    let sent = conn.transport().sent_frames();
    match &sent[1].body {
        Body::Startup(options) => assert_eq!(options["CQL_VERSION"], "3.0.0"),
        other => panic!("Expected STARTUP body, got {:?}", other),
    }
}

#[test]
fn test_handshake_custom_cql_version() {
    let transport = script(&[supported(&["3.0.0", "3.1.0"]), ready()]);
    let config = ConnectionConfig::builder().cql_version("3.1.0").build();
    let conn = Connection::handshake(transport, &config).unwrap();

    let sent = conn.transport().sent_frames();
    match &sent[1].body {
        Body::Startup(options) => {
            assert_eq!(options.len(), 1);
            assert_eq!(options["CQL_VERSION"], "3.1.0");
        }
        other => panic!("Expected STARTUP body, got {:?}", other),
    }
}

#[test]
fn test_handshake_error_reply_to_options() {
    let transport = script(&[error(10, "bad")]);
    let result = Connection::handshake(transport, &ConnectionConfig::default());

    match result {
        Err(CqlError::Remote { code, message }) => {
            assert_eq!(code, 10);
            assert_eq!(message, "bad");
        }
        Err(other) => panic!("Expected Remote error, got {:?}", other),
        Ok(_) => panic!("Handshake must not reach Ready"),
    }
}

#[test]
fn test_handshake_error_reply_to_startup() {
    let transport = script(&[supported(&["3.0.0"]), error(0x000A, "Invalid CQL_VERSION")]);
    let err = Connection::handshake(transport, &ConnectionConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err, CqlError::Remote { code: 10, .. }));
}

#[test]
fn test_handshake_ready_instead_of_supported() {
    let transport = script(&[ready()]);
    let err = Connection::handshake(transport, &ConnectionConfig::default())
        .err()
        .unwrap();

    match err {
        CqlError::UnexpectedOpcode { expected, got } => {
            assert_eq!(expected, Opcode::Supported);
            assert_eq!(got, Opcode::Ready as u8);
        }
        other => panic!("Expected UnexpectedOpcode, got {:?}", other),
    }
}

#[test]
fn test_handshake_authenticate_is_unexpected() {
    let mut authenticate = vec![0x81, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x06];
    authenticate.extend_from_slice(&[0x00, 0x04, b'A', b'u', b't', b'h']);

    let transport = script(&[supported(&["3.0.0"]), authenticate]);
    let err = Connection::handshake(transport, &ConnectionConfig::default())
        .err()
        .unwrap();

    match err {
        CqlError::UnexpectedOpcode { expected, got } => {
            assert_eq!(expected, Opcode::Ready);
            assert_eq!(got, Opcode::Authenticate as u8);
        }
        other => panic!("Expected UnexpectedOpcode, got {:?}", other),
    }
}

#[test]
fn test_handshake_peer_hangs_up() {
    let transport = script(&[]);
    let err = Connection::handshake(transport, &ConnectionConfig::default())
        .err()
        .unwrap();
    assert!(err.is_truncated());
}

#[test]
fn test_handshake_truncated_supported() {
    let mut partial = supported(&["3.0.0"]);
    partial.truncate(partial.len() - 3);

    let transport = script(&[partial]);
    let err = Connection::handshake(transport, &ConnectionConfig::default())
        .err()
        .unwrap();
    assert!(err.is_truncated());
    assert!(err.is_fatal());
}

#[test]
fn test_handshake_rejects_oversized_body() {
    let transport = script(&[supported(&["3.0.0"]), ready()]);
    let config = ConnectionConfig::builder().max_body_size(8).build();
    let err = Connection::handshake(transport, &config).err().unwrap();
    assert!(matches!(err, CqlError::ProtocolViolation(_)));
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_query_set_keyspace() {
    let mut conn = connect(&[set_keyspace("system")]);

    let keyspace = conn.query("use system").unwrap();
    assert_eq!(keyspace, "system");
    assert_eq!(conn.state(), ConnectionState::Ready);

    let sent = conn.transport().sent_frames();
    let query = sent.last().unwrap();
    assert_eq!(query.opcode(), Some(Opcode::Query));
    assert_eq!(query.header.stream, 0);
    assert_eq!(
        query.body,
        Body::Query(QueryBody::new("use system", Consistency::Any))
    );
}

#[test]
fn test_query_with_consistency() {
    let mut conn = connect(&[set_keyspace("ks")]);
    conn.query_with_consistency("use ks", Consistency::Quorum)
        .unwrap();

    let sent = conn.transport().sent_frames();
    assert_eq!(
        sent.last().unwrap().body,
        Body::Query(QueryBody::new("use ks", Consistency::Quorum))
    );
}

#[test]
fn test_query_rows_is_unsupported() {
    let rows = reply(
        Opcode::Result,
        Body::Result(ResultBody::Rows(vec![0, 0, 0, 1].into())),
    );
    let mut conn = connect(&[rows, set_keyspace("after")]);

    match conn.query("select * from system.local") {
        Err(CqlError::UnsupportedResult { kind }) => assert_eq!(kind, 0x0002),
        other => panic!("Expected UnsupportedResult, got {:?}", other),
    }

    // Connection stays usable
    assert_eq!(conn.state(), ConnectionState::Ready);
    assert_eq!(conn.query("use after").unwrap(), "after");
}

#[test]
fn test_query_void_is_unsupported() {
    let void = reply(Opcode::Result, Body::Result(ResultBody::Void));
    let mut conn = connect(&[void]);

    let err = conn.query("insert into t (k) values (1)").unwrap_err();
    assert!(matches!(err, CqlError::UnsupportedResult { kind: 1 }));
}

#[test]
fn test_query_remote_error_keeps_connection() {
    let mut conn = connect(&[error(0x2200, "Keyspace 'nope' does not exist"), set_keyspace("system")]);

    match conn.query("use nope") {
        Err(CqlError::Remote { code, message }) => {
            assert_eq!(code, 0x2200);
            assert!(message.contains("nope"));
        }
        other => panic!("Expected Remote error, got {:?}", other),
    }

    assert_eq!(conn.state(), ConnectionState::Ready);
    assert_eq!(conn.query("use system").unwrap(), "system");
}

#[test]
fn test_query_truncated_reply_fails_connection() {
    let mut partial = set_keyspace("system");
    partial.truncate(5);
    let mut conn = connect(&[partial]);

    assert!(conn.query("use system").unwrap_err().is_truncated());
    assert_eq!(conn.state(), ConnectionState::Failed);

    match conn.query("use system") {
        Err(CqlError::InvalidState { state, operation }) => {
            assert_eq!(state, "failed");
            assert_eq!(operation, "query");
        }
        other => panic!("Expected InvalidState, got {:?}", other),
    }
}

#[test]
fn test_query_unexpected_opcode_fails_connection() {
    let mut conn = connect(&[ready()]);

    let err = conn.query("use system").unwrap_err();
    assert!(matches!(
        err,
        CqlError::UnexpectedOpcode {
            expected: Opcode::Result,
            ..
        }
    ));
    assert_eq!(conn.state(), ConnectionState::Failed);
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_close_then_query() {
    let mut conn = connect(&[]);

    conn.close().unwrap();
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(conn.transport().closed);

    assert!(matches!(
        conn.query("use system"),
        Err(CqlError::InvalidState { state: "closed", .. })
    ));
}

#[test]
fn test_second_close_surfaces_transport_error() {
    let mut conn = connect(&[]);

    conn.close().unwrap();
    match conn.close() {
        Err(CqlError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotConnected),
        other => panic!("Expected Io error, got {:?}", other),
    }
    assert_eq!(conn.state(), ConnectionState::Closed);
}

#[test]
fn test_close_after_failure() {
    let mut conn = connect(&[ready()]);
    let _ = conn.query("use system");
    assert_eq!(conn.state(), ConnectionState::Failed);

    conn.close().unwrap();
    assert_eq!(conn.state(), ConnectionState::Closed);
}

// =============================================================================
// Shared Connection Tests
// =============================================================================

#[test]
fn test_shared_connection_serializes_queries() {
    let replies: Vec<Vec<u8>> = (0..8).map(|_| set_keyspace("shared")).collect();
    let shared = SharedConnection::new(connect(&replies));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let conn = shared.clone();
            thread::spawn(move || conn.query("use shared"))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), "shared");
    }

    assert_eq!(shared.state(), ConnectionState::Ready);
    shared.close().unwrap();
    assert_eq!(shared.state(), ConnectionState::Closed);
}
