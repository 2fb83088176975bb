//! C10 — request handler / wire protocol.
//!
//! A hand-rolled accept loop over `std::net::TcpListener`, not a conformant
//! HTTP library: the wire format only borrows HTTP's request-line shape
//! (`METHOD /plugin/param HTTP/1.1`) and never emits headers or a
//! `Content-Length`, so a real HTTP server crate would fight the format
//! rather than produce it. Grounded on the teacher's raw-socket dispatch
//! loop (`quiverdb_metrics`'s `loop { match server.recv() { ... } }`),
//! adapted to `std::net` directly for that reason.
//!
//! Single-threaded and cooperative: one connection is read, dispatched, and
//! answered to completion before the next is accepted, matching the core's
//! concurrency model (no concurrent writers to the arena).

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::panic;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use crate::snapshot;
use crate::store::Store;

struct Request {
    method: String,
    plugin: String,
    param: String,
    body: Vec<u8>,
}

/// Parses the request line plus whatever follows the first blank line as
/// the body. Header lines other than the request line are ignored; there's
/// no `Content-Length` to honor, so the body is simply "everything left in
/// the buffer" after the first `\r\n\r\n`.
fn parse_request(raw: &[u8]) -> Option<Request> {
    let header_end = raw.windows(4).position(|w| w == b"\r\n\r\n")?;
    let head = std::str::from_utf8(&raw[..header_end]).ok()?;
    let request_line = head.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?;

    let path = path.strip_prefix('/')?;
    let mut segments = path.splitn(2, '/');
    let plugin = segments.next()?.to_string();
    let param = segments.next().unwrap_or("");
    let param = param.split('?').next().unwrap_or("").to_string();

    let body = raw[header_end + 4..].to_vec();
    Some(Request {
        method,
        plugin,
        param,
        body,
    })
}

fn write_response(stream: &mut TcpStream, code: u16, reason: &str, body: &[u8]) {
    let status_line = format!("HTTP/1.1 {code} {reason}\r\n\r\n");
    if let Err(e) = stream.write_all(status_line.as_bytes()) {
        warn!("failed writing response status: {e}");
        return;
    }
    if let Err(e) = stream.write_all(body) {
        warn!("failed writing response body: {e}");
    }
}

fn handle_nosql(store: &mut Store, method: &str, key: &str, body: &[u8], stream: &mut TcpStream) {
    let key = key.as_bytes();
    match method {
        "HEAD" => {
            if store.has(key) {
                write_response(stream, 200, "OK", b"");
            } else {
                write_response(stream, 404, "Not Found", b"");
            }
        }
        "GET" => match store.get(key) {
            Some(value) => write_response(stream, 200, "OK", &value),
            None => write_response(stream, 404, "Not Found", b""),
        },
        "PUT" | "POST" => {
            if store.set(key, body) {
                write_response(stream, 200, "OK", b"");
            } else {
                debug!("set failed for key of {} bytes: capacity exhausted", key.len());
                write_response(stream, 500, "Internal Server Error", b"");
            }
        }
        "DELETE" => {
            if store.delete(key) {
                write_response(stream, 200, "OK", b"");
            } else {
                write_response(stream, 404, "Not Found", b"");
            }
        }
        _ => write_response(stream, 501, "Not Implemented", b""),
    }
}

fn handle_snapshot(store: &mut Store, method: &str, action: &str, body: &[u8], stream: &mut TcpStream) {
    if method != "POST" {
        write_response(stream, 501, "Not Implemented", b"");
        return;
    }
    let path = String::from_utf8_lossy(body);
    let path = path.trim();
    let result = match action {
        "backup" => snapshot::save(store, path),
        "restore" => snapshot::load(store, path),
        _ => {
            write_response(stream, 501, "Not Implemented", b"");
            return;
        }
    };
    match result {
        Ok(()) => write_response(stream, 200, "OK", b""),
        Err(e) => {
            error!("snapshot {action} failed: {e:#}");
            write_response(stream, 500, "Internal Server Error", e.to_string().as_bytes());
        }
    }
}

/// Reads one request off `stream` to completion, dispatches it against
/// `store`, and writes the response before returning. Exposed (not just
/// used by [`serve`]) so integration tests can drive a `Store` over a real
/// socket pair without going through the listener's accept loop.
pub fn handle_connection(store: &mut Store, mut stream: TcpStream) {
    let mut buf = Vec::new();
    if let Err(e) = stream.read_to_end(&mut buf) {
        warn!("failed reading request: {e}");
        return;
    }

    let request = match parse_request(&buf) {
        Some(r) => r,
        None => {
            debug!("malformed request line, dropping connection");
            write_response(&mut stream, 501, "Not Implemented", b"");
            return;
        }
    };

    // A corrupted-arena assertion panicking mid-request must not take the
    // single-threaded server down with it; the connection is dropped
    // instead so subsequent requests keep being served.
    let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| match request.plugin.as_str() {
        "nosql" => handle_nosql(store, &request.method, &request.param, &request.body, &mut stream),
        "snapshot" => handle_snapshot(store, &request.method, &request.param, &request.body, &mut stream),
        _ => write_response(&mut stream, 501, "Not Implemented", b""),
    }));

    if outcome.is_err() {
        error!("request handler panicked, arena may be corrupt; connection dropped without a response");
    }
}

/// Binds `addr` and serves requests until the process is killed. Each
/// connection is read, dispatched, and answered fully before the listener
/// accepts the next one.
pub fn serve(addr: &str, mut store: Store) -> Result<()> {
    let listener = TcpListener::bind(addr).with_context(|| format!("binding {addr}"))?;
    info!("listening on {addr}");

    for conn in listener.incoming() {
        match conn {
            Ok(stream) => {
                debug!("accepted connection from {:?}", stream.peer_addr());
                handle_connection(&mut store, stream);
            }
            Err(e) => warn!("accept error: {e}"),
        }
    }
    Ok(())
}
