//! JSON-RPC transport with retry and node rotation.
//!
//! # Responsibilities
//! - Send one request to the node the pool selects
//! - Enforce a deadline per attempt
//! - Classify each outcome and feed it to the retry machine and the pool
//!
//! # Failure Classification
//! ```text
//! timeout / network error / non-2xx / unreadable body → transport failure
//!     → report_failure(node), back off, select again (bounded by retries)
//! JSON-RPC error object → NodeRejection, returned immediately
//! JSON-RPC result       → success
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::HiveConfig;
use crate::node_pool::{Node, NodePool};
use crate::observability::metrics::{self, CallOutcome};
use crate::resilience::{with_deadline, RetryEvent, RetryMachine, RetryPolicy, RetryState};
use crate::rpc::connector::{Connector, HttpConnector};
use crate::rpc::jsonrpc::{resolve_params, Params, RpcReply, RpcRequest};

/// Anything that can answer `call(method, params)` with JSON.
///
/// Higher layers depend on this trait only, so they can run against a mock.
#[async_trait]
pub trait RpcClient: Send + Sync {
    async fn call(&self, method: &str, params: Params) -> BlockchainResult<Value>;
}

enum AttemptError {
    Transport(String),
    Rejected(BlockchainError),
}

/// Sends JSON-RPC calls through a [`NodePool`].
#[derive(Debug)]
pub struct RpcTransport {
    pool: Arc<NodePool>,
    connector: Arc<dyn Connector>,
    policy: RetryPolicy,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcTransport {
    pub fn new(
        pool: Arc<NodePool>,
        connector: Arc<dyn Connector>,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            pool,
            connector,
            policy,
            timeout,
            next_id: AtomicU64::new(1),
        }
    }

    /// Transport over the configured nodes with the reqwest connector.
    pub fn from_config(config: &HiveConfig) -> BlockchainResult<Self> {
        let pool = Arc::new(NodePool::from_config(&config.nodes)?);
        let timeout = Duration::from_secs(config.rpc.timeout_secs);
        // Per-request timeouts come from each call; the client only bounds connecting
        let connector = Arc::new(HttpConnector::new(timeout)?);
        Ok(Self::new(pool, connector, policy_from(config), timeout))
    }

    pub fn pool(&self) -> &Arc<NodePool> {
        &self.pool
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call with an explicit retry budget and per-attempt timeout.
    pub async fn call_with(
        &self,
        method: &str,
        params: Params,
        retries: u32,
        timeout: Duration,
    ) -> BlockchainResult<Value> {
        let policy = RetryPolicy {
            max_retries: retries,
            ..self.policy
        };
        let request = RpcRequest::new(
            self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            resolve_params(method, params),
        );

        let mut machine = RetryMachine::new(policy);
        let mut last_error: Option<String> = None;

        loop {
            match machine.state() {
                RetryState::Selecting { attempt } => {
                    let Some(node) = self.pool.select() else {
                        machine.advance(RetryEvent::NoNodeAvailable);
                        continue;
                    };
                    machine.advance(RetryEvent::NodeSelected);

                    match self.attempt(&node, &request, timeout).await {
                        Ok(value) => {
                            machine.advance(RetryEvent::Succeeded);
                            return Ok(value);
                        }
                        Err(AttemptError::Rejected(err)) => {
                            machine.advance(RetryEvent::Rejected);
                            tracing::debug!(method, node = %node.url(), error = %err, "Node rejected request");
                            return Err(err);
                        }
                        Err(AttemptError::Transport(message)) => {
                            tracing::warn!(
                                method,
                                node = %node.url(),
                                attempt,
                                error = %message,
                                "RPC transport failure, rotating node"
                            );
                            last_error = Some(message);
                            machine.advance(RetryEvent::TransportFailed);
                        }
                    }
                }
                RetryState::Retrying { attempt, delay } => {
                    tracing::info!(
                        method,
                        attempt,
                        max_attempts = policy.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Retrying RPC call"
                    );
                    metrics::record_rpc_retry(method);
                    tokio::time::sleep(delay).await;
                    machine.advance(RetryEvent::BackoffElapsed);
                }
                RetryState::Exhausted { attempts } => {
                    return Err(match last_error {
                        Some(message) => BlockchainError::Transport { attempts, message },
                        None => BlockchainError::NoHealthyNodes,
                    });
                }
                // Calls complete inside the Selecting arm
                RetryState::Calling { attempt } | RetryState::Finished { attempts: attempt } => {
                    return Err(BlockchainError::Transport {
                        attempts: attempt,
                        message: "retry loop ended without a reply".to_string(),
                    });
                }
            }
        }
    }

    async fn attempt(
        &self,
        node: &Node,
        request: &RpcRequest,
        timeout: Duration,
    ) -> Result<Value, AttemptError> {
        let start = Instant::now();
        let method = request.method.as_str();
        let node_label = node.url().as_str();

        let body = match with_deadline(timeout, self.connector.post(node.url(), request, timeout)).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => return Err(self.transport_failure(node, method, start, e.to_string())),
            Err(e) => return Err(self.transport_failure(node, method, start, e.to_string())),
        };

        match RpcReply::from_body(body) {
            Some(RpcReply::Result(value)) => {
                self.pool.report_success(node, start.elapsed());
                metrics::record_rpc_request(method, node_label, CallOutcome::Success, start);
                Ok(value)
            }
            Some(RpcReply::Error(error)) => {
                // The node answered; its health is fine
                self.pool.report_success(node, start.elapsed());
                metrics::record_rpc_request(method, node_label, CallOutcome::Rejected, start);
                Err(AttemptError::Rejected(error.into()))
            }
            None => Err(self.transport_failure(
                node,
                method,
                start,
                "response is not a JSON-RPC reply".to_string(),
            )),
        }
    }

    fn transport_failure(
        &self,
        node: &Node,
        method: &str,
        start: Instant,
        message: String,
    ) -> AttemptError {
        self.pool.report_failure(node);
        metrics::record_rpc_request(method, node.url().as_str(), CallOutcome::TransportError, start);
        AttemptError::Transport(message)
    }
}

#[async_trait]
impl RpcClient for RpcTransport {
    async fn call(&self, method: &str, params: Params) -> BlockchainResult<Value> {
        self.call_with(method, params, self.policy.max_retries, self.timeout)
            .await
    }
}

pub fn policy_from(config: &HiveConfig) -> RetryPolicy {
    RetryPolicy {
        max_retries: config.rpc.retries,
        base_delay_ms: config.rpc.base_delay_ms,
        max_delay_ms: config.rpc.max_delay_ms,
    }
}
