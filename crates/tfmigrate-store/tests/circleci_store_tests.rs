#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use tfmigrate_core::config::StoreConfig;
use tfmigrate_core::errors::MigrateError;
use tfmigrate_core::{DeleteOutcome, EnvSnapshot, KeyedStore, LockManager};
use tfmigrate_store::CircleCiStore;

/// What the canned server saw
struct RecordedRequest {
    method: String,
    target: String,
    body: String,
}

/// Answer exactly one request with a fixed status and body
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<RecordedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/api/v1.1", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap().to_string();
        let target = parts.next().unwrap().to_string();

        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
        }

        let mut body_bytes = vec![0u8; content_length];
        reader.read_exact(&mut body_bytes).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
        .unwrap();
        stream.flush().unwrap();

        RecordedRequest {
            method,
            target,
            body: String::from_utf8(body_bytes).unwrap(),
        }
    });

    (base_url, handle)
}

fn store_for(base_url: &str) -> CircleCiStore {
    let snapshot = EnvSnapshot::from_pairs([
        ("CIRCLE_TOKEN", "t0k"),
        ("CIRCLE_PROJECT_USERNAME", "acme"),
        ("CIRCLE_PROJECT_REPONAME", "infra"),
    ]);
    CircleCiStore::new(StoreConfig::from_snapshot(&snapshot).with_api_url(base_url)).unwrap()
}

#[test]
fn test_put_created() {
    let (base_url, server) = serve_once("201 Created", "{}");
    let store = store_for(&base_url);

    store.put("TF_MIGRATION_VERSION", "4").unwrap();

    let request = server.join().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(
        request.target,
        "/api/v1.1/project/github/acme/infra/envvar?circle-token=t0k"
    );
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["name"], "TF_MIGRATION_VERSION");
    assert_eq!(body["value"], "4");
}

#[test]
fn test_put_rejected_carries_status_and_body() {
    let (base_url, server) = serve_once("403 Forbidden", "permission denied");
    let store = store_for(&base_url);

    let err = store.put("TF_MIGRATION_VERSION", "4").unwrap_err();
    server.join().unwrap();

    assert_eq!(
        err,
        MigrateError::StoreRejected {
            status: "403 Forbidden".to_string(),
            body: "permission denied".to_string(),
        }
    );
}

#[test]
fn test_put_ok_is_not_created() {
    let (base_url, server) = serve_once("200 OK", "");
    let store = store_for(&base_url);

    let err = store.put("TF_MIGRATION_LOCK", "abc").unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, MigrateError::StoreRejected { .. }));
}

#[test]
fn test_delete_ok() {
    let (base_url, server) = serve_once("200 OK", "{\"message\":\"ok\"}");
    let store = store_for(&base_url);

    let outcome = store.delete("TF_MIGRATION_LOCK_abc").unwrap();

    let request = server.join().unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(request.method, "DELETE");
    assert_eq!(
        request.target,
        "/api/v1.1/project/github/acme/infra/envvar/TF_MIGRATION_LOCK_abc?circle-token=t0k"
    );
}

#[test]
fn test_delete_not_found() {
    let (base_url, server) = serve_once("404 Not Found", "");
    let store = store_for(&base_url);

    let outcome = store.delete("TF_MIGRATION_LOCK_abc").unwrap();
    server.join().unwrap();

    assert_eq!(outcome, DeleteOutcome::NotFound);
}

#[test]
fn test_delete_server_error() {
    let (base_url, server) = serve_once("500 Internal Server Error", "upstream down");
    let store = store_for(&base_url);

    let err = store.delete("TF_MIGRATION_LOCK_abc").unwrap_err();
    server.join().unwrap();

    assert_eq!(
        err.to_string(),
        "failed to lock: 500 Internal Server Error\nupstream down"
    );
}

#[test]
fn test_acquire_contention_over_http() {
    let (base_url, server) = serve_once("404 Not Found", "");
    let store = store_for(&base_url);
    let snapshot = EnvSnapshot::from_pairs([("TF_MIGRATION_LOCK", "abc")]);

    let err = LockManager::new(&snapshot, &store).acquire().unwrap_err();

    let request = server.join().unwrap();
    assert_eq!(err, MigrateError::LockNotFound);
    assert!(request.target.contains("/envvar/TF_MIGRATION_LOCK_abc?"));
}

#[test]
fn test_missing_token_fails_before_any_request() {
    let snapshot = EnvSnapshot::from_pairs([("CIRCLE_PROJECT_SLUG", "github/acme/infra")]);
    let store = CircleCiStore::new(
        StoreConfig::from_snapshot(&snapshot).with_api_url("http://127.0.0.1:1/api/v1.1"),
    )
    .unwrap();

    let err = store.put("TF_MIGRATION_VERSION", "1").unwrap_err();
    assert_eq!(err.to_string(), "missing CIRCLE_TOKEN env var");
}

#[test]
fn test_missing_project() {
    let snapshot = EnvSnapshot::from_pairs([("CIRCLE_TOKEN", "t0k")]);
    let store = CircleCiStore::new(StoreConfig::from_snapshot(&snapshot)).unwrap();

    let err = store.delete("TF_MIGRATION_LOCK_abc").unwrap_err();
    assert_eq!(err, MigrateError::MissingProject);
}

#[test]
fn test_transport_error_hides_token() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/api/v1.1", listener.local_addr().unwrap());
    drop(listener);
    let store = store_for(&base_url);

    let err = store.put("TF_MIGRATION_VERSION", "1").unwrap_err();

    assert!(matches!(err, MigrateError::Transport { .. }));
    assert!(!err.to_string().contains("t0k"));
}
