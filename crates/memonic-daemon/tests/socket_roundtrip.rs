//! End-to-end test of the dispatcher against a real temp store: exercises
//! `tools/call` for `remember`/`recall` and the JSON-RPC error shape for an
//! unknown tool, without needing a live socket.

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

#[path = "../src/dispatcher.rs"]
mod dispatcher;
#[path = "../src/protocol/mod.rs"]
mod protocol;

use dispatcher::Dispatcher;
use memonic_core::{Config, MemoryEngine};
use protocol::types::JsonRpcRequest;

fn dispatcher() -> (TempDir, Dispatcher) {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.store_path = dir.path().join("store");
    let engine = Arc::new(MemoryEngine::open_without_embeddings(config, 8).unwrap());
    (dir, Dispatcher::new(engine))
}

fn request(id: i64, method: &str, params: Value) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(Value::from(id)),
        method: method.to_string(),
        params: Some(params),
    }
}

#[test]
fn initialize_reports_server_info() {
    let (_dir, d) = dispatcher();
    let resp = d.handle(request(1, "initialize", Value::Null));
    assert!(resp.error.is_none());
    assert_eq!(resp.result.unwrap()["serverInfo"]["name"], "memonic");
}

#[test]
fn remember_then_recall_round_trips() {
    let (_dir, d) = dispatcher();

    let remember = d.handle(request(
        1,
        "tools/call",
        json!({"name": "remember", "arguments": {"kind": "episode", "text": "socket roundtrip memory"}}),
    ));
    assert!(remember.error.is_none());
    let id = remember.result.unwrap()["id"].as_str().unwrap().to_string();

    let recall = d.handle(request(
        2,
        "tools/call",
        json!({"name": "recall", "arguments": {"query": "socket roundtrip", "mode": "sparse"}}),
    ));
    assert!(recall.error.is_none());
    let results = recall.result.unwrap()["results"].clone();
    let ids: Vec<String> = results
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert!(ids.contains(&id));
}

#[test]
fn unknown_tool_reports_tool_not_found() {
    let (_dir, d) = dispatcher();
    let resp = d.handle(request(1, "tools/call", json!({"name": "nonexistent", "arguments": {}})));
    let error = resp.error.unwrap();
    assert_eq!(error.data.unwrap()["kind"], "tool_not_found");
}

#[test]
fn get_missing_node_is_not_found() {
    let (_dir, d) = dispatcher();
    let resp = d.handle(request(
        1,
        "tools/call",
        json!({"name": "get", "arguments": {"id": memonic_core::id::NodeId::new().to_string_hex()}}),
    ));
    let error = resp.error.unwrap();
    assert_eq!(error.data.unwrap()["kind"], "not_found");
}
