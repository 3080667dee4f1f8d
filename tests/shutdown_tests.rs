//! Graceful Shutdown Tests
//!
//! Runs the real server on an ephemeral port so that open live streams
//! take part in the shutdown sequence.

use std::sync::Arc;
use std::time::Duration;

use loghub::api::{create_router, AppState};
use loghub::persistence::FileSnapshotStore;
use loghub::service::{EngineConfig, IngestionService};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

async fn read_until(stream: &mut TcpStream, needle: &str) -> String {
    let mut seen = String::new();
    let mut buf = [0u8; 4096];
    while !seen.contains(needle) {
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before {needle:?}, got {seen:?}");
        seen.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    seen
}

#[tokio::test]
async fn test_open_sse_stream_does_not_block_shutdown() {
    let dir = TempDir::new().unwrap();
    let backend = FileSnapshotStore::in_dir(dir.path(), "logs-data.json", "device-aliases.json");
    let config = EngineConfig {
        write_delay: Duration::from_secs(60),
        ..EngineConfig::default()
    };
    let service = Arc::new(IngestionService::new(config, Arc::new(backend)));

    let state = Arc::new(AppState::new(service.clone()));
    let token = state.shutdown_token();
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_token = token.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { server_token.cancelled().await })
            .await
    });

    let mut client = TcpStream::connect(addr).await.unwrap();
    client
        .write_all(b"GET /api/stream HTTP/1.1\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n")
        .await
        .unwrap();

    let head = timeout(Duration::from_secs(5), read_until(&mut client, "event: aliases"))
        .await
        .expect("bootstrap never arrived");
    assert!(head.starts_with("HTTP/1.1 200"));
    assert!(head.contains("event: history"));

    service.ingest_one(&json!({"message": "before shutdown"})).unwrap();
    timeout(Duration::from_secs(5), read_until(&mut client, "event: event:new"))
        .await
        .expect("live event never arrived");

    // The stream is still open; shutdown has to end it
    token.cancel();
    let served = timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop with an SSE client attached");
    served.unwrap().unwrap();

    service.shutdown().await.unwrap();
    let raw = std::fs::read_to_string(dir.path().join("logs-data.json")).unwrap();
    let on_disk: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(on_disk[0]["message"], "before shutdown");
}
