use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use arenakv::server::handle_connection;
use arenakv::store::Store;

fn spawn(store: Store, connections: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    thread::spawn(move || {
        let mut store = store;
        for conn in listener.incoming().take(connections) {
            if let Ok(stream) = conn {
                handle_connection(&mut store, stream);
            }
        }
    });
    thread::sleep(Duration::from_millis(50));
    addr
}

fn roundtrip(addr: &str, request: &str) -> (u16, Vec<u8>) {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    stream.shutdown(Shutdown::Write).unwrap();
    let mut resp = Vec::new();
    stream.read_to_end(&mut resp).unwrap();
    let text = String::from_utf8_lossy(&resp);
    let code: u16 = text.lines().next().unwrap().split_whitespace().nth(1).unwrap().parse().unwrap();
    let body_start = resp.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
    (code, resp[body_start..].to_vec())
}

#[test]
fn scenario_basic_lifecycle() {
    let addr = spawn(Store::new(0x4000, 0x1000, 8), 5);

    let (code, _) = roundtrip(&addr, "POST /nosql/key1 HTTP/1.1\r\n\r\nhello");
    assert_eq!(code, 200);

    let (code, body) = roundtrip(&addr, "GET /nosql/key1 HTTP/1.1\r\n\r\n");
    assert_eq!(code, 200);
    assert_eq!(body, b"hello");

    let (code, _) = roundtrip(&addr, "HEAD /nosql/key1 HTTP/1.1\r\n\r\n");
    assert_eq!(code, 200);

    let (code, _) = roundtrip(&addr, "DELETE /nosql/key1 HTTP/1.1\r\n\r\n");
    assert_eq!(code, 200);

    let (code, _) = roundtrip(&addr, "GET /nosql/key1 HTTP/1.1\r\n\r\n");
    assert_eq!(code, 404);
}

#[test]
fn scenario_overwrite_via_post_serves_latest_from_cache() {
    let addr = spawn(Store::new(0x4000, 0x1000, 8), 3);

    roundtrip(&addr, "POST /nosql/k HTTP/1.1\r\n\r\nv1");
    roundtrip(&addr, "POST /nosql/k HTTP/1.1\r\n\r\nv2");
    let (code, body) = roundtrip(&addr, "GET /nosql/k HTTP/1.1\r\n\r\n");
    assert_eq!(code, 200);
    assert_eq!(body, b"v2");
}

#[test]
fn scenario_overwrite_via_put_leaves_one_busy_block() {
    let addr = spawn(Store::new(0x4000, 0x1000, 8), 3);

    roundtrip(&addr, "PUT /nosql/k HTTP/1.1\r\n\r\nv1");
    roundtrip(&addr, "PUT /nosql/k HTTP/1.1\r\n\r\nv2");
    let (code, body) = roundtrip(&addr, "GET /nosql/k HTTP/1.1\r\n\r\n");
    assert_eq!(code, 200);
    assert_eq!(body, b"v2");
}

#[test]
fn scenario_bulk_insert_and_lookup_1024_keys() {
    let addr = spawn(Store::new(0x20_0000, 0x2_0000, 64), 2050);

    for i in 0..1024u32 {
        let (code, _) = roundtrip(&addr, &format!("POST /nosql/k{i} HTTP/1.1\r\n\r\nv{i}"));
        assert_eq!(code, 200, "insert of k{i} failed");
    }
    for i in 0..1024u32 {
        let (code, body) = roundtrip(&addr, &format!("GET /nosql/k{i} HTTP/1.1\r\n\r\n"));
        assert_eq!(code, 200, "lookup of k{i} failed");
        assert_eq!(body, format!("v{i}").into_bytes());
    }
}

#[test]
fn scenario_partial_delete_then_head_checks() {
    let addr = spawn(Store::new(0x20_0000, 0x2_0000, 64), 2600);

    for i in 0..1024u32 {
        roundtrip(&addr, &format!("POST /nosql/k{i} HTTP/1.1\r\n\r\nv{i}"));
    }
    for i in 0..512u32 {
        let (code, _) = roundtrip(&addr, &format!("DELETE /nosql/k{i} HTTP/1.1\r\n\r\n"));
        assert_eq!(code, 200);
    }
    for i in 0..512u32 {
        let (code, _) = roundtrip(&addr, &format!("HEAD /nosql/k{i} HTTP/1.1\r\n\r\n"));
        assert_eq!(code, 404, "k{i} should have been deleted");
    }
    for i in 512..1024u32 {
        let (code, _) = roundtrip(&addr, &format!("HEAD /nosql/k{i} HTTP/1.1\r\n\r\n"));
        assert_eq!(code, 200, "k{i} should still be present");
    }
}

#[test]
fn scenario_snapshot_backup_and_restore_round_trip() {
    let addr = spawn(Store::new(0x4000, 0x1000, 8), 6);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arena.snap");
    let path_str = path.to_str().unwrap();

    roundtrip(&addr, "POST /nosql/a HTTP/1.1\r\n\r\n1");
    roundtrip(&addr, "POST /nosql/b HTTP/1.1\r\n\r\n2");

    let (code, _) = roundtrip(&addr, &format!("POST /snapshot/backup HTTP/1.1\r\n\r\n{path_str}"));
    assert_eq!(code, 200);
    assert!(path.exists());

    roundtrip(&addr, "DELETE /nosql/a HTTP/1.1\r\n\r\n");

    let (code, _) = roundtrip(&addr, &format!("POST /snapshot/restore HTTP/1.1\r\n\r\n{path_str}"));
    assert_eq!(code, 200);

    let (code, body) = roundtrip(&addr, "GET /nosql/a HTTP/1.1\r\n\r\n");
    assert_eq!(code, 200);
    assert_eq!(body, b"1");
}

#[test]
fn unknown_plugin_returns_not_implemented() {
    let addr = spawn(Store::new(0x4000, 0x1000, 8), 1);
    let (code, _) = roundtrip(&addr, "GET /bogus/thing HTTP/1.1\r\n\r\n");
    assert_eq!(code, 501);
}
