//! TCP Tests
//!
//! Runs the client against a scripted server on a loopback socket.

use std::io;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use cqlink::protocol::{
    read_frame, write_frame, Body, Frame, Header, Opcode, ResultBody, StringMap,
    StringMultiMap, NO_FLAGS, RESPONSE,
};
use cqlink::{Connection, ConnectionConfig, ConnectionState, CqlError};

// =============================================================================
// Helper Functions
// =============================================================================

fn send(stream: &mut TcpStream, opcode: Opcode, body: Body) {
    let mut frame = Frame::new(Header::new(RESPONSE, NO_FLAGS, 0, opcode), body);
    write_frame(stream, &mut frame).unwrap();
}

fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

/// Answers the handshake and one `use <keyspace>` query.
/// Returns the STARTUP options the client sent.
fn serve_one_session(listener: TcpListener) -> StringMap {
    let (mut stream, _) = listener.accept().unwrap();

    let options = read_frame(&mut stream).unwrap();
    assert_eq!(options.opcode(), Some(Opcode::Options));

    let mut supported = StringMultiMap::new();
    supported.insert(
        "CQL_VERSION".to_string(),
        vec!["3.0.0".to_string(), "3.1.0".to_string()],
    );
    send(&mut stream, Opcode::Supported, Body::Supported(supported));

    let startup = match read_frame(&mut stream).unwrap().body {
        Body::Startup(options) => options,
        other => panic!("Expected STARTUP, got {:?}", other),
    };
    send(&mut stream, Opcode::Ready, Body::None);

    let keyspace = match read_frame(&mut stream).unwrap().body {
        Body::Query(query) => query.cql.trim_start_matches("use ").to_string(),
        other => panic!("Expected QUERY, got {:?}", other),
    };
    send(
        &mut stream,
        Opcode::Result,
        Body::Result(ResultBody::SetKeyspace(keyspace)),
    );

    startup
}

// =============================================================================
// Session Tests
// =============================================================================

#[test]
fn test_tcp_handshake_and_query() {
    let (listener, addr) = bind();
    let server = thread::spawn(move || serve_one_session(listener));

    let config = ConnectionConfig::builder()
        .address(addr)
        .recv_timeout(Some(Duration::from_secs(5)))
        .build();
    let mut conn = Connection::connect(&config).unwrap();
    assert_eq!(conn.state(), ConnectionState::Ready);

    assert_eq!(conn.query("use system").unwrap(), "system");
    conn.close().unwrap();

    let startup = server.join().unwrap();
    assert_eq!(startup.len(), 1);
    assert_eq!(startup["CQL_VERSION"], "3.0.0");
}

#[test]
fn test_tcp_recv_timeout() {
    let (listener, addr) = bind();
    let server = thread::spawn(move || {
        // Accept, swallow OPTIONS, never answer
        let (stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_millis(600));
        drop(stream);
    });

    let config = ConnectionConfig::builder()
        .address(addr)
        .recv_timeout(Some(Duration::from_millis(100)))
        .build();

    match Connection::connect(&config) {
        Err(CqlError::Io(e)) => assert!(
            matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut),
            "unexpected error kind {:?}",
            e.kind()
        ),
        Err(other) => panic!("Expected Io timeout, got {:?}", other),
        Ok(_) => panic!("Handshake must not complete without replies"),
    }

    server.join().unwrap();
}

#[test]
fn test_tcp_connection_refused() {
    // Grab a free port, then release it
    let (listener, addr) = bind();
    drop(listener);

    let config = ConnectionConfig::builder()
        .address(addr)
        .connect_timeout(Duration::from_millis(500))
        .build();

    let err = Connection::connect(&config).err().unwrap();
    assert!(matches!(err, CqlError::Io(_)), "got {:?}", err);
}

#[test]
fn test_tcp_unresolvable_address() {
    let config = ConnectionConfig::builder()
        .address("no-such-host.invalid")
        .build();

    let err = Connection::connect(&config).err().unwrap();
    assert!(matches!(err, CqlError::Config(_)), "got {:?}", err);
}
