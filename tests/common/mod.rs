//! Shared utilities for integration tests: a programmable mock Hive node.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use hive_client::blockchain::types::{ChainId, TIME_FORMAT};
use hive_client::blockchain::SignedTransaction;
use hive_client::HiveConfig;

#[derive(Default)]
struct NodeState {
    head_block_number: AtomicU32,
    requests: AtomicU32,
    fail_next: AtomicU32,
    expire_next: AtomicBool,
    delay_next_ms: AtomicU64,
    methods: Mutex<Vec<String>>,
    seen: Mutex<HashSet<String>>,
}

/// Handle to a running mock node.
pub struct MockNode {
    pub addr: SocketAddr,
    state: Arc<NodeState>,
}

#[allow(dead_code)]
impl MockNode {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer the next `n` requests with HTTP 503.
    pub fn fail_next(&self, n: u32) {
        self.state.fail_next.store(n, Ordering::SeqCst);
    }

    /// Hold the next answered request for `delay` before replying.
    pub fn delay_next(&self, delay: Duration) {
        self.state.delay_next_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Report the next synchronous broadcast as expired before inclusion.
    pub fn expire_next_broadcast(&self) {
        self.state.expire_next.store(true, Ordering::SeqCst);
    }

    /// Every HTTP request received, including failed ones.
    pub fn requests(&self) -> u32 {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Methods of the requests that reached the dispatcher.
    pub fn methods(&self) -> Vec<String> {
        self.state.methods.lock().unwrap().clone()
    }

    pub fn broadcasts(&self) -> usize {
        self.methods()
            .iter()
            .filter(|m| m.starts_with("condenser_api.broadcast_transaction"))
            .count()
    }
}

/// Start a mock node on an ephemeral local port.
pub async fn start_mock_node() -> MockNode {
    let state = Arc::new(NodeState {
        head_block_number: AtomicU32::new(80_000_000),
        ..Default::default()
    });

    let app = Router::new()
        .route("/", post(handle))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockNode { addr, state }
}

/// URL of a local port with nothing listening.
#[allow(dead_code)]
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Config pointed at `urls` with fast retries.
#[allow(dead_code)]
pub fn test_config(urls: Vec<String>) -> HiveConfig {
    let mut config = HiveConfig::default();
    config.nodes.urls = urls;
    config.nodes.max_failures = 1;
    config.rpc.timeout_secs = 2;
    config.rpc.base_delay_ms = 1;
    config.rpc.max_delay_ms = 5;
    config
}

async fn handle(State(state): State<Arc<NodeState>>, Json(request): Json<Value>) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    let pending = state.fail_next.load(Ordering::SeqCst);
    if pending > 0 {
        state.fail_next.store(pending - 1, Ordering::SeqCst);
        return (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response();
    }

    let delay_ms = state.delay_next_ms.swap(0, Ordering::SeqCst);
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    state.methods.lock().unwrap().push(method.clone());

    let reply = match dispatch(&state, &method, request.get("params")) {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err(error) => json!({"jsonrpc": "2.0", "id": id, "error": error}),
    };
    Json(reply).into_response()
}

fn dispatch(state: &NodeState, method: &str, params: Option<&Value>) -> Result<Value, Value> {
    match method {
        "condenser_api.get_dynamic_global_properties" => {
            let head = state.head_block_number.fetch_add(1, Ordering::SeqCst);
            let mut block_id = [0u8; 20];
            block_id[..4].copy_from_slice(&head.to_be_bytes());
            block_id[4..8].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
            Ok(json!({
                "head_block_number": head,
                "head_block_id": hex::encode(block_id),
                "time": Utc::now().naive_utc().format(TIME_FORMAT).to_string(),
                "current_witness": "mock",
            }))
        }
        "database_api.get_version" => Ok(json!({
            "blockchain_version": "1.27.5",
            "chain_id": ChainId::mainnet().to_string(),
        })),
        "condenser_api.verify_authority" => Ok(json!(true)),
        "condenser_api.broadcast_transaction" | "condenser_api.broadcast_transaction_synchronous" => {
            let tx: SignedTransaction = params
                .and_then(|p| p.get(0))
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .ok_or_else(|| json!({"code": -32602, "message": "Invalid parameters"}))?;

            let tx_id = tx.id();
            if !state.seen.lock().unwrap().insert(tx_id.clone()) {
                return Err(json!({
                    "code": -32003,
                    "message": "Duplicate transaction check failed",
                    "data": {"name": "duplicate_transaction_exception"},
                }));
            }

            if method.ends_with("_synchronous") {
                if state.expire_next.swap(false, Ordering::SeqCst) {
                    return Ok(json!({"id": tx_id, "block_num": 0, "trx_num": -1, "expired": true}));
                }
                Ok(json!({
                    "id": tx_id,
                    "block_num": state.head_block_number.load(Ordering::SeqCst),
                    "trx_num": 0,
                    "expired": false,
                }))
            } else {
                Ok(json!({}))
            }
        }
        other => Err(json!({"code": -32601, "message": format!("method not found: {}", other)})),
    }
}
