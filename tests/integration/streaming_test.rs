// Streaming read integration tests
//
// A read answers with the backend's metadata first and then forwards the
// pushed point data as binary frames over the same connection.

use super::test_harness::{error_code, Frame, GatewayHarness, POINTS_PER_SESSION};
use point_gateway::backend::InMemoryBackend;
use point_gateway::config::Config;
use point_gateway::store::MemoryStore;
use serde_json::json;

#[tokio::test]
async fn test_read_sends_metadata_before_points() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    let mut client = gateway.client().await;
    let session = client.create().await;

    client
        .send(json!({"id": "r", "type": "read", "session": session}))
        .await;

    // The first frame after the command must be its completion
    let metadata = match client.next_frame().await {
        Frame::Text(value) => value,
        Frame::Binary(data) => panic!("{} bytes arrived before the metadata", data.len()),
    };
    assert_eq!(metadata["id"], "r");
    assert_eq!(metadata["result"]["pointsRead"], POINTS_PER_SESSION);
    let bytes_count = metadata["result"]["bytesCount"].as_u64().unwrap();

    let data = client.read_bytes(bytes_count).await;
    assert_eq!(data, InMemoryBackend::expected_bytes(0, POINTS_PER_SESSION));
}

#[tokio::test]
async fn test_read_respects_start_and_count() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    let mut client = gateway.client().await;
    let session = client.create().await;

    let metadata = client
        .request(json!({"id": 1, "type": "read", "session": session, "start": 100, "count": 50}))
        .await;
    assert_eq!(metadata["result"]["pointsRead"], 50);
    assert_eq!(metadata["result"]["bytesCount"], 400);

    let data = client.read_bytes(400).await;
    assert_eq!(data, InMemoryBackend::expected_bytes(100, 50));
}

#[tokio::test]
async fn test_failed_read_streams_nothing() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    let mut client = gateway.client().await;
    let session = client.create().await;
    gateway.backend.set_fail_read(true);

    let reply = client
        .request(json!({"id": 1, "type": "read", "session": session}))
        .await;
    assert_eq!(error_code(&reply), Some("BackendError"));

    // The next frame is the answer to the following command, not stray data
    let reply = client
        .request(json!({"id": 2, "type": "pointsCount", "session": session}))
        .await;
    assert_eq!(reply["id"], 2);
    assert_eq!(reply["result"]["count"], POINTS_PER_SESSION);
}

#[tokio::test]
async fn test_empty_read_returns_metadata_only() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    let mut client = gateway.client().await;
    let session = client.create().await;

    let metadata = client
        .request(json!({"id": 1, "type": "read", "session": session, "count": 0}))
        .await;
    assert_eq!(metadata["result"]["pointsRead"], 0);
    assert_eq!(metadata["result"]["bytesCount"], 0);

    let reply = client
        .request(json!({"id": 2, "type": "pointsCount", "session": session}))
        .await;
    assert_eq!(reply["id"], 2);
    assert_eq!(reply["result"]["count"], POINTS_PER_SESSION);
}

#[tokio::test]
async fn test_read_of_unknown_session() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    let mut client = gateway.client().await;

    let reply = client
        .request(json!({"id": 1, "type": "read", "session": "ghost"}))
        .await;

    assert_eq!(error_code(&reply), Some("InvalidSession"));
    assert!(gateway.backend.calls_of("read").is_empty());
}

#[tokio::test]
async fn test_read_is_split_into_chunk_sized_frames() {
    let store = MemoryStore::new();
    store.seed_list("rh", &["rh-1"]);
    let mut config = Config::default();
    config.streaming.chunk_size = 256;
    let gateway =
        GatewayHarness::start_shared(store, InMemoryBackend::new(POINTS_PER_SESSION), config)
            .await;
    let mut client = gateway.client().await;
    let session = client.create().await;

    let metadata = client
        .request(json!({"id": 1, "type": "read", "session": session}))
        .await;
    let expected = metadata["result"]["bytesCount"].as_u64().unwrap();

    let mut total = 0u64;
    let mut frames = 0;
    while total < expected {
        match client.next_frame().await {
            Frame::Binary(chunk) => {
                assert!(chunk.len() <= 256);
                total += chunk.len() as u64;
                frames += 1;
            }
            Frame::Text(value) => panic!("unexpected completion {}", value),
        }
    }
    assert_eq!(total, expected);
    assert!(frames >= 32);
}

#[tokio::test]
async fn test_consecutive_reads_on_one_connection() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    let mut client = gateway.client().await;
    let session = client.create().await;

    for start in [0u64, 500] {
        let metadata = client
            .request(json!({"id": start, "type": "read", "session": session, "start": start, "count": 10}))
            .await;
        assert_eq!(metadata["id"], start);
        let data = client.read_bytes(80).await;
        assert_eq!(data, InMemoryBackend::expected_bytes(start, 10));
    }
}
