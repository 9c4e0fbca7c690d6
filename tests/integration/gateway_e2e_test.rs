// End-to-end command tests over a real WebSocket connection
//
// Covers session creation, affinity-based routing, destroy, and the error
// completions the gateway sends for invalid input and store failures.

use super::test_harness::{error_code, GatewayHarness, POINTS_PER_SESSION};
use point_gateway::backend::InMemoryBackend;
use point_gateway::config::Config;
use point_gateway::store::MemoryStore;
use serde_json::{json, Value};
use std::collections::HashSet;

#[tokio::test]
async fn test_create_returns_session_and_pins_affinity() {
    let gateway = GatewayHarness::start(&["rh-1", "rh-2"]).await;
    let mut client = gateway.client().await;

    let reply = client.request(json!({"id": 1, "type": "create"})).await;

    assert_eq!(reply["id"], 1);
    let session = reply["result"]["session"].as_str().unwrap();
    let owner = gateway.backend.owner(session).unwrap();
    assert_eq!(gateway.store.hash_field("affinity", session), Some(owner));
}

#[tokio::test]
async fn test_commands_follow_session_affinity() {
    let gateway = GatewayHarness::start(&["rh-1", "rh-2", "rh-3", "rh-4"]).await;
    let mut client = gateway.client().await;

    let mut sessions = Vec::new();
    for _ in 0..8 {
        sessions.push(client.create().await);
    }

    for (i, session) in sessions.iter().enumerate() {
        let reply = client
            .request(json!({"id": i, "type": "pointsCount", "session": session}))
            .await;
        assert_eq!(reply["result"], json!({"count": POINTS_PER_SESSION}));
    }

    // Every pointsCount went to the backend that created the session
    for call in gateway.backend.calls_of("pointsCount") {
        let session = call.session.unwrap();
        assert_eq!(
            gateway.store.hash_field("affinity", &session).unwrap(),
            call.backend
        );
    }
}

#[tokio::test]
async fn test_create_with_empty_pool() {
    let gateway = GatewayHarness::start(&[]).await;
    let mut client = gateway.client().await;

    let reply = client.request(json!({"id": "c", "type": "create"})).await;

    assert_eq!(reply["id"], "c");
    assert_eq!(error_code(&reply), Some("NoBackendsAvailable"));
    assert!(gateway.backend.calls().is_empty());
}

#[tokio::test]
async fn test_create_with_unreachable_store() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    gateway.store.set_fail_reads(true);
    let mut client = gateway.client().await;

    let reply = client.request(json!({"id": 1, "type": "create"})).await;
    assert_eq!(error_code(&reply), Some("StoreUnavailable"));
}

#[tokio::test]
async fn test_failed_affinity_write_leaves_no_session_behind() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    gateway.store.set_fail_writes(true);
    let mut client = gateway.client().await;

    let reply = client.request(json!({"id": 1, "type": "create"})).await;
    assert_eq!(error_code(&reply), Some("AffinityWriteFailed"));

    let undo = gateway.backend.calls_of("destroy");
    assert_eq!(undo.len(), 1);
    assert_eq!(gateway.backend.session_count(), 0);

    gateway.store.set_fail_writes(false);
    let session = undo[0].session.clone().unwrap();
    let reply = client
        .request(json!({"id": 2, "type": "pointsCount", "session": session}))
        .await;
    assert_eq!(error_code(&reply), Some("InvalidSession"));
}

#[tokio::test]
async fn test_destroy_then_session_is_unknown() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    let mut client = gateway.client().await;
    let session = client.create().await;

    let reply = client
        .request(json!({"id": 1, "type": "destroy", "session": session}))
        .await;
    assert_eq!(reply, json!({"id": 1, "result": null}));

    let reply = client
        .request(json!({"id": 2, "type": "pointsCount", "session": session}))
        .await;
    assert_eq!(error_code(&reply), Some("InvalidSession"));
    assert_eq!(gateway.store.hash_field("affinity", &session), None);
}

#[tokio::test]
async fn test_destroy_unknown_session_makes_no_backend_call() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    let mut client = gateway.client().await;

    let reply = client
        .request(json!({"id": 1, "type": "destroy", "session": "never-created"}))
        .await;

    assert_eq!(error_code(&reply), Some("InvalidSession"));
    assert!(gateway.backend.calls().is_empty());
}

#[tokio::test]
async fn test_missing_or_empty_session_is_invalid() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    let mut client = gateway.client().await;

    for (id, command) in [
        (1, json!({"id": 1, "type": "pointsCount"})),
        (2, json!({"id": 2, "type": "destroy", "session": ""})),
        (3, json!({"id": 3, "type": "read"})),
    ] {
        let reply = client.request(command).await;
        assert_eq!(reply["id"], id);
        assert_eq!(error_code(&reply), Some("InvalidSession"));
    }
    assert!(gateway.backend.calls().is_empty());
}

#[tokio::test]
async fn test_backend_errors_pass_through() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    let mut client = gateway.client().await;
    let session = client.create().await;
    gateway.backend.set_fail_points_count(true);

    let reply = client
        .request(json!({"id": 1, "type": "pointsCount", "session": session}))
        .await;

    assert_eq!(error_code(&reply), Some("BackendError"));
}

#[tokio::test]
async fn test_invalid_commands_get_error_completions() {
    let gateway = GatewayHarness::start(&["rh-1"]).await;
    let mut client = gateway.client().await;

    let reply = client.request(json!({"id": 42, "type": "teleport"})).await;
    assert_eq!(reply["id"], 42);
    assert_eq!(error_code(&reply), Some("InvalidCommand"));

    client.send_raw("{{{").await;
    let reply = client.next_text().await;
    assert_eq!(reply["id"], Value::Null);
    assert_eq!(error_code(&reply), Some("InvalidCommand"));
}

#[tokio::test]
async fn test_concurrent_commands_all_complete() {
    let gateway = GatewayHarness::start(&["rh-1", "rh-2"]).await;
    let mut client = gateway.client().await;

    for id in 0..20 {
        client.send(json!({"id": id, "type": "create"})).await;
    }

    let mut answered = HashSet::new();
    for _ in 0..20 {
        let reply = client.next_text().await;
        assert!(reply["result"]["session"].is_string(), "{}", reply);
        answered.insert(reply["id"].as_u64().unwrap());
    }
    assert_eq!(answered.len(), 20);
    assert_eq!(gateway.backend.session_count(), 20);
}

#[tokio::test]
async fn test_sessions_are_usable_from_another_gateway_instance() {
    let store = MemoryStore::new();
    store.seed_list("rh", &["rh-1", "rh-2", "rh-3"]);
    let backend = InMemoryBackend::new(POINTS_PER_SESSION);
    let first =
        GatewayHarness::start_shared(store.clone(), backend.clone(), Config::default()).await;
    let second = GatewayHarness::start_shared(store, backend, Config::default()).await;

    let session = first.client().await.create().await;

    let mut other = second.client().await;
    let reply = other
        .request(json!({"id": 1, "type": "pointsCount", "session": session}))
        .await;
    assert_eq!(reply["result"]["count"], POINTS_PER_SESSION);

    let reply = other
        .request(json!({"id": 2, "type": "destroy", "session": session}))
        .await;
    assert_eq!(reply["result"], Value::Null);
}
