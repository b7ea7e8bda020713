//! Translates JSON-RPC requests into [`MemoryEngine`] calls and back (§4.10).
//! `initialize`/`tools/list`/`tools/call`/`shutdown` are the only JSON-RPC
//! methods; the tool surface (remember/recall/connect/...) is dispatched by
//! name inside `tools/call`, mirroring the way an MCP server multiplexes one
//! transport method over many named tools.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};

use memonic_core::dynamics::feedback::FeedbackKind;
use memonic_core::id::NodeId;
use memonic_core::memory::{EdgeType, NodeKind, Provenance};
use memonic_core::retrieval::{Recall, SearchMode, Zoom};
use memonic_core::vector::Vector;
use memonic_core::MemoryEngine;

use crate::protocol::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

const PROTOCOL_VERSION: &str = "2025-01-01";

pub struct Dispatcher {
    engine: Arc<MemoryEngine>,
}

impl Dispatcher {
    pub fn new(engine: Arc<MemoryEngine>) -> Self {
        Dispatcher { engine }
    }

    /// Handles one request, never panicking: every error path returns a
    /// `JsonRpcResponse` rather than propagating.
    pub fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        let result = match request.method.as_str() {
            "initialize" => Ok(self.initialize()),
            "tools/list" => Ok(self.tools_list()),
            "tools/call" => self.tools_call(request.params.unwrap_or(Value::Null)),
            "shutdown" => Ok(json!({"ok": true})),
            other => Err(JsonRpcError::method_not_found(other)),
        };
        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(err) => JsonRpcResponse::error(id, err),
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": "memonic",
                "version": memonic_core::VERSION,
            },
        })
    }

    fn tools_list(&self) -> Value {
        json!({
            "tools": [
                "remember", "observe", "get", "update", "add_tag", "remove_tag",
                "connect", "disconnect", "recall", "resonate", "full_resonate",
                "ppr_query", "hawkes_timeline", "find_causal_chains", "lsh_find_similar",
                "forget", "feedback", "set_intentions", "observe_context",
                "entity_link", "entity_resolve", "ledger_save", "ledger_load",
                "ledger_list", "run_cycle", "stats", "health", "run_recovery",
                "checkpoint",
            ]
        })
    }

    fn tools_call(&self, params: Value) -> Result<Value, JsonRpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("missing `name`"))?;
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);
        self.call_tool(name, &args)
    }

    fn call_tool(&self, name: &str, args: &Value) -> Result<Value, JsonRpcError> {
        match name {
            "remember" => self.remember(args),
            "observe" => self.observe(args),
            "get" => self.get(args),
            "update" => self.update(args),
            "add_tag" => self.add_tag(args),
            "remove_tag" => self.remove_tag(args),
            "connect" => self.connect(args),
            "disconnect" => self.disconnect(args),
            "recall" => self.recall(args),
            "resonate" => self.resonate(args),
            "full_resonate" => self.full_resonate(args),
            "ppr_query" => self.ppr_query(args),
            "hawkes_timeline" => self.hawkes_timeline(args),
            "find_causal_chains" => self.find_causal_chains(args),
            "lsh_find_similar" => self.lsh_find_similar(args),
            "forget" => self.forget(args),
            "feedback" => self.feedback(args),
            "set_intentions" => self.set_intentions(args),
            "observe_context" => self.observe_context(args),
            "entity_link" => self.entity_link(args),
            "entity_resolve" => self.entity_resolve(args),
            "ledger_save" => self.ledger_save(args),
            "ledger_load" => self.ledger_load(args),
            "ledger_list" => self.ledger_list(),
            "run_cycle" => self.run_cycle(args),
            "stats" => self.stats(),
            "health" => self.health(args),
            "run_recovery" => self.run_recovery(),
            "checkpoint" => self.checkpoint(),
            other => Err(JsonRpcError::tool_not_found(other)),
        }
    }

    // -- argument helpers -----------------------------------------------

    fn str_field<'a>(args: &'a Value, key: &str) -> Result<&'a str, JsonRpcError> {
        args.get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params(&format!("missing string field `{key}`")))
    }

    fn node_id_field(args: &Value, key: &str) -> Result<NodeId, JsonRpcError> {
        let s = Self::str_field(args, key)?;
        NodeId::from_string_hex(s).ok_or_else(|| JsonRpcError::invalid_params(&format!("malformed node id `{s}`")))
    }

    fn usize_field(args: &Value, key: &str, default: usize) -> usize {
        args.get(key).and_then(Value::as_u64).map(|v| v as usize).unwrap_or(default)
    }

    fn f32_field(args: &Value, key: &str, default: f32) -> f32 {
        args.get(key).and_then(Value::as_f64).map(|v| v as f32).unwrap_or(default)
    }

    fn bool_field(args: &Value, key: &str, default: bool) -> bool {
        args.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    fn tags_field(args: &Value, key: &str) -> HashSet<String> {
        args.get(key)
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default()
    }

    fn str_list_field(args: &Value, key: &str) -> Vec<String> {
        args.get(key)
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default()
    }

    fn node_kind_field(args: &Value, key: &str) -> Result<NodeKind, JsonRpcError> {
        let v = args.get(key).cloned().unwrap_or(Value::String("episode".into()));
        serde_json::from_value(v).map_err(|_| JsonRpcError::invalid_params(&format!("invalid `{key}`")))
    }

    fn edge_type_field(args: &Value, key: &str) -> Result<EdgeType, JsonRpcError> {
        let v = args
            .get(key)
            .cloned()
            .ok_or_else(|| JsonRpcError::invalid_params(&format!("missing `{key}`")))?;
        serde_json::from_value(v).map_err(|_| JsonRpcError::invalid_params(&format!("invalid `{key}`")))
    }

    fn search_mode_field(args: &Value, key: &str) -> SearchMode {
        args.get(key)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or(SearchMode::Hybrid)
    }

    fn zoom_field(args: &Value, key: &str) -> Zoom {
        args.get(key)
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or(Zoom::Normal)
    }

    fn feedback_kind_field(args: &Value, key: &str) -> Result<FeedbackKind, JsonRpcError> {
        let v = args
            .get(key)
            .cloned()
            .ok_or_else(|| JsonRpcError::invalid_params(&format!("missing `{key}`")))?;
        serde_json::from_value(v).map_err(|_| JsonRpcError::invalid_params(&format!("invalid `{key}`")))
    }

    fn embedding_field(args: &Value, key: &str) -> Option<Vector> {
        args.get(key)
            .and_then(Value::as_array)
            .map(|arr| Vector(arr.iter().filter_map(Value::as_f64).map(|v| v as f32).collect()))
    }

    fn provenance_field(args: &Value, key: &str) -> Option<Provenance> {
        args.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    fn recall_json(r: &Recall) -> Value {
        json!({
            "id": r.id.to_string_hex(),
            "relevance": r.relevance,
            "node": r.node,
        })
    }

    // -- tools --------------------------------------------------------

    fn remember(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let kind = Self::node_kind_field(args, "kind")?;
        let text = Self::str_field(args, "text")?.to_string();
        let embedding = Self::embedding_field(args, "embedding");
        let tags = Self::tags_field(args, "tags");
        let provenance = Self::provenance_field(args, "provenance");
        let id = self
            .engine
            .remember(kind, text, embedding, tags, provenance)
            .map_err(JsonRpcError::from)?;
        Ok(json!({"id": id.to_string_hex()}))
    }

    fn observe(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let text = Self::str_field(args, "text")?.to_string();
        let tags = Self::tags_field(args, "tags");
        let id = self.engine.observe(text, tags).map_err(JsonRpcError::from)?;
        Ok(json!({"id": id.to_string_hex()}))
    }

    fn get(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let id = Self::node_id_field(args, "id")?;
        let node = self.engine.get(&id).map_err(JsonRpcError::from)?;
        match node {
            Some(n) => Ok(json!({"node": n})),
            None => Err(JsonRpcError::not_found(&format!("no node {}", id.to_string_hex()))),
        }
    }

    fn update(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let id = Self::node_id_field(args, "id")?;
        let text = args.get("text").and_then(Value::as_str).map(String::from);
        self.engine.update(&id, text).map_err(JsonRpcError::from)?;
        Ok(json!({"ok": true}))
    }

    fn add_tag(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let id = Self::node_id_field(args, "id")?;
        let tag = Self::str_field(args, "tag")?.to_string();
        self.engine.add_tag(&id, tag).map_err(JsonRpcError::from)?;
        Ok(json!({"ok": true}))
    }

    fn remove_tag(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let id = Self::node_id_field(args, "id")?;
        let tag = Self::str_field(args, "tag")?;
        self.engine.remove_tag(&id, tag).map_err(JsonRpcError::from)?;
        Ok(json!({"ok": true}))
    }

    fn connect(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let source = Self::node_id_field(args, "source")?;
        let target = Self::node_id_field(args, "target")?;
        let edge_type = Self::edge_type_field(args, "edge_type")?;
        let weight = Self::f32_field(args, "weight", 0.5);
        self.engine.connect(&source, &target, edge_type, weight).map_err(JsonRpcError::from)?;
        Ok(json!({"ok": true}))
    }

    fn disconnect(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let source = Self::node_id_field(args, "source")?;
        let target = Self::node_id_field(args, "target")?;
        let edge_type = match args.get("edge_type") {
            Some(v) if !v.is_null() => Some(Self::edge_type_field(args, "edge_type")?),
            _ => None,
        };
        self.engine.disconnect(&source, &target, edge_type).map_err(JsonRpcError::from)?;
        Ok(json!({"ok": true}))
    }

    fn recall(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let query = Self::str_field(args, "query")?;
        let limit = Self::usize_field(args, "limit", 10);
        let threshold = Self::f32_field(args, "threshold", 0.0);
        let mode = Self::search_mode_field(args, "mode");
        let zoom = Self::zoom_field(args, "zoom");
        let tag = args.get("tag").and_then(Value::as_str).map(String::from);
        let primed = Self::bool_field(args, "primed", false);
        let learn = Self::bool_field(args, "learn", false);
        let compete = Self::bool_field(args, "compete", false);
        let results = self
            .engine
            .recall(query, limit, threshold, mode, zoom, tag, primed, learn, compete)
            .map_err(JsonRpcError::from)?;
        Ok(json!({"results": results.iter().map(Self::recall_json).collect::<Vec<_>>()}))
    }

    fn resonate(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let query = Self::str_field(args, "query")?;
        let limit = Self::usize_field(args, "limit", 10);
        let spread_strength = Self::f32_field(args, "spread_strength", 1.0);
        let learn = Self::bool_field(args, "learn", false);
        let hebbian_strength = Self::f32_field(args, "hebbian_strength", 0.04);
        let results = self
            .engine
            .resonate(query, limit, spread_strength, learn, hebbian_strength)
            .map_err(JsonRpcError::from)?;
        Ok(json!({"results": results.iter().map(Self::recall_json).collect::<Vec<_>>()}))
    }

    fn full_resonate(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let query = Self::str_field(args, "query")?;
        let limit = Self::usize_field(args, "limit", 10);
        let spread_strength = Self::f32_field(args, "spread_strength", 1.0);
        let hebbian_strength = Self::f32_field(args, "hebbian_strength", 0.04);
        let exclude_tags = Self::str_list_field(args, "exclude_tags");
        let results = self
            .engine
            .full_resonate(query, limit, spread_strength, hebbian_strength, exclude_tags)
            .map_err(JsonRpcError::from)?;
        Ok(json!({"results": results.iter().map(Self::recall_json).collect::<Vec<_>>()}))
    }

    fn ppr_query(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let query = Self::str_field(args, "query")?;
        let k = Self::usize_field(args, "k", 10);
        let epsilon = Self::f32_field(args, "epsilon", 1e-4);
        let results = self.engine.ppr_query(query, k, epsilon).map_err(JsonRpcError::from)?;
        Ok(json!({
            "results": results.into_iter().map(|(id, score)| json!({"id": id.to_string_hex(), "score": score})).collect::<Vec<_>>()
        }))
    }

    fn hawkes_timeline(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let hours = args.get("hours").and_then(Value::as_f64).unwrap_or(24.0);
        let limit = Self::usize_field(args, "limit", 20);
        let results = self.engine.hawkes_timeline(hours, limit).map_err(JsonRpcError::from)?;
        Ok(json!({
            "results": results.into_iter().map(|(id, score)| json!({"id": id.to_string_hex(), "score": score})).collect::<Vec<_>>()
        }))
    }

    fn find_causal_chains(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let effect_id = Self::node_id_field(args, "effect_id")?;
        let max_depth = Self::usize_field(args, "max_depth", 4);
        let min_confidence = Self::f32_field(args, "min_confidence", 0.1);
        let chains = self
            .engine
            .find_causal_chains(effect_id, max_depth, min_confidence)
            .map_err(JsonRpcError::from)?;
        Ok(json!({
            "chains": chains.into_iter().map(|c| json!({
                "path": c.path.iter().map(|id| id.to_string_hex()).collect::<Vec<_>>(),
                "confidence": c.confidence,
            })).collect::<Vec<_>>()
        }))
    }

    fn lsh_find_similar(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let vector = Self::embedding_field(args, "embedding")
            .ok_or_else(|| JsonRpcError::invalid_params("missing `embedding`"))?;
        let k = Self::usize_field(args, "k", 10);
        let ids = self.engine.lsh_find_similar(&vector, k).map_err(JsonRpcError::from)?;
        Ok(json!({"ids": ids.iter().map(|id| id.to_string_hex()).collect::<Vec<_>>()}))
    }

    fn forget(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let id = Self::node_id_field(args, "id")?;
        let cascade = Self::bool_field(args, "cascade", false);
        let rewire = Self::bool_field(args, "rewire", false);
        let cascade_strength = Self::f32_field(args, "cascade_strength", 0.5);
        self.engine.forget(id, cascade, rewire, cascade_strength).map_err(JsonRpcError::from)?;
        Ok(json!({"ok": true}))
    }

    fn feedback(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let id = Self::node_id_field(args, "id")?;
        let kind = Self::feedback_kind_field(args, "kind")?;
        let magnitude = Self::f32_field(args, "magnitude", 1.0);
        self.engine.record_feedback(id, kind, magnitude);
        Ok(json!({"ok": true}))
    }

    fn set_intentions(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let intentions = Self::str_list_field(args, "intentions");
        self.engine.set_intentions(intentions).map_err(JsonRpcError::from)?;
        Ok(json!({"ok": true}))
    }

    fn observe_context(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let text = Self::str_field(args, "text")?.to_string();
        self.engine.observe_context(text).map_err(JsonRpcError::from)?;
        Ok(json!({"ok": true}))
    }

    fn entity_link(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let name = Self::str_field(args, "name")?.to_string();
        let id = Self::node_id_field(args, "id")?;
        self.engine.entity_link(name, id).map_err(JsonRpcError::from)?;
        Ok(json!({"ok": true}))
    }

    fn entity_resolve(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let name = Self::str_field(args, "name")?;
        let id = self.engine.entity_resolve(name).map_err(JsonRpcError::from)?;
        Ok(json!({"id": id.map(|i| i.to_string_hex())}))
    }

    fn ledger_save(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let name = Self::str_field(args, "name")?.to_string();
        let summary = Self::str_field(args, "summary")?.to_string();
        let id = self.engine.ledger_save(name, summary).map_err(JsonRpcError::from)?;
        Ok(json!({"id": id.to_string_hex()}))
    }

    fn ledger_load(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let name = Self::str_field(args, "name")?;
        let node = self.engine.ledger_load(name).map_err(JsonRpcError::from)?;
        match node {
            Some(n) => Ok(json!({"node": n})),
            None => Err(JsonRpcError::not_found(&format!("no ledger entry `{name}`"))),
        }
    }

    fn ledger_list(&self) -> Result<Value, JsonRpcError> {
        let entries = self.engine.ledger_list().map_err(JsonRpcError::from)?;
        Ok(json!({"entries": entries}))
    }

    fn run_cycle(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let checkpoint = Self::bool_field(args, "checkpoint", false);
        let report = self.engine.run_cycle(checkpoint).map_err(JsonRpcError::from)?;
        Ok(json!({"report": report}))
    }

    fn stats(&self) -> Result<Value, JsonRpcError> {
        let stats = self.engine.stats().map_err(JsonRpcError::from)?;
        Ok(json!({"stats": stats}))
    }

    fn health(&self, args: &Value) -> Result<Value, JsonRpcError> {
        let stale_after_ms = args.get("stale_after_ms").and_then(Value::as_i64).unwrap_or(7 * 24 * 3_600_000);
        let score = self.engine.health(stale_after_ms).map_err(JsonRpcError::from)?;
        Ok(json!({
            "structural": score.structural,
            "semantic": score.semantic,
            "temporal": score.temporal,
            "capacity": score.capacity,
            "ojas": score.ojas(),
            "status": score.status(),
        }))
    }

    fn run_recovery(&self) -> Result<Value, JsonRpcError> {
        let report = self.engine.run_recovery().map_err(JsonRpcError::from)?;
        Ok(json!({"report": report}))
    }

    fn checkpoint(&self) -> Result<Value, JsonRpcError> {
        self.engine.checkpoint().map_err(JsonRpcError::from)?;
        Ok(json!({"ok": true}))
    }
}
