//! Transaction broadcasting.
//!
//! # Responsibilities
//! - Refuse expired or unsigned transactions before they reach a node
//! - Submit synchronously (wait for inclusion) or asynchronously (mempool only)
//! - Translate node rejections into typed errors
//! - Under non-strict mode, report duplicate and already-irreversible
//!   rejections in the result instead of failing
//!
//! # Design Decisions
//! - Transport failures are never softened; strictness applies to node verdicts only
//! - The broadcaster does not poll for confirmation; callers get the id

use chrono::{NaiveDateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

use crate::blockchain::transaction::SignedTransaction;
use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::blockchain::verifier::is_missing_authority;
use crate::observability::metrics;
use crate::rpc::{Api, Params, RpcClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastMode {
    /// `broadcast_transaction_synchronous`: returns once the block is produced.
    Synchronous,
    /// `broadcast_transaction`: returns once the node accepts it.
    Asynchronous,
}

impl BroadcastMode {
    pub fn from_synchronous(synchronous: bool) -> Self {
        if synchronous {
            BroadcastMode::Synchronous
        } else {
            BroadcastMode::Asynchronous
        }
    }

    pub fn method(&self) -> String {
        match self {
            BroadcastMode::Synchronous => {
                Api::Condenser.method("broadcast_transaction_synchronous")
            }
            BroadcastMode::Asynchronous => Api::Condenser.method("broadcast_transaction"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastMode::Synchronous => "synchronous",
            BroadcastMode::Asynchronous => "asynchronous",
        }
    }
}

/// What happened to a submitted transaction.
#[derive(Debug, Clone)]
pub struct BroadcastResult {
    pub transaction_id: String,
    /// True only for a synchronous broadcast the node confirmed in a block.
    pub included: bool,
    pub block_num: Option<u32>,
    /// Set for soft rejections accepted under non-strict mode.
    pub error: Option<BlockchainError>,
}

impl BroadcastResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub struct Broadcaster {
    rpc: Arc<dyn RpcClient>,
    warning: bool,
}

impl Broadcaster {
    pub fn new(rpc: Arc<dyn RpcClient>) -> Self {
        Self {
            rpc,
            warning: false,
        }
    }

    /// Log soft rejections at warn level instead of debug.
    pub fn with_warning(mut self, warning: bool) -> Self {
        self.warning = warning;
        self
    }

    pub async fn broadcast(
        &self,
        tx: &SignedTransaction,
        synchronous: bool,
        strict: bool,
    ) -> BlockchainResult<BroadcastResult> {
        let mode = BroadcastMode::from_synchronous(synchronous);
        self.broadcast_at(tx, mode, strict, Utc::now().naive_utc())
            .await
    }

    /// Broadcast with an explicit notion of "now" for the expiration check.
    pub async fn broadcast_at(
        &self,
        tx: &SignedTransaction,
        mode: BroadcastMode,
        strict: bool,
        now: NaiveDateTime,
    ) -> BlockchainResult<BroadcastResult> {
        let transaction_id = tx.id();

        if tx.transaction.is_expired_at(now) {
            metrics::record_broadcast(mode.as_str(), "expired");
            return Err(BlockchainError::ExpiredTransaction {
                expiration: tx.expiration(),
                now,
            });
        }
        if tx.signatures.is_empty() {
            metrics::record_broadcast(mode.as_str(), "unsigned");
            return Err(BlockchainError::VerificationFailure(
                "transaction carries no signatures".to_string(),
            ));
        }

        let body = serde_json::to_value(tx)
            .map_err(|e| BlockchainError::InvalidOperation(format!("transaction JSON: {}", e)))?;

        match self.rpc.call(&mode.method(), Params::Positional(vec![body])).await {
            Ok(result) => {
                // A synchronous reply with `expired: true` means the block came after expiration
                if result.get("expired").and_then(Value::as_bool) == Some(true) {
                    metrics::record_broadcast(mode.as_str(), "expired");
                    tracing::warn!(tx_id = %transaction_id, "Transaction expired before inclusion");
                    return Err(BlockchainError::ExpiredTransaction {
                        expiration: tx.expiration(),
                        now,
                    });
                }

                let included = mode == BroadcastMode::Synchronous;
                let block_num = result
                    .get("block_num")
                    .and_then(Value::as_u64)
                    .and_then(|n| u32::try_from(n).ok());

                let outcome = if included { "included" } else { "accepted" };
                metrics::record_broadcast(mode.as_str(), outcome);
                tracing::info!(
                    tx_id = %transaction_id,
                    mode = mode.as_str(),
                    block_num = ?block_num,
                    "Transaction broadcast"
                );
                Ok(BroadcastResult {
                    transaction_id,
                    included,
                    block_num,
                    error: None,
                })
            }
            Err(BlockchainError::NodeRejection { code, message, data }) => {
                let err = classify_rejection(tx, &transaction_id, now, code, message, data);
                if !strict && err.is_soft_rejection() {
                    metrics::record_broadcast(mode.as_str(), "soft_rejected");
                    if self.warning {
                        tracing::warn!(tx_id = %transaction_id, error = %err, "Broadcast rejected, continuing");
                    } else {
                        tracing::debug!(tx_id = %transaction_id, error = %err, "Broadcast rejected, continuing");
                    }
                    return Ok(BroadcastResult {
                        transaction_id,
                        included: false,
                        block_num: None,
                        error: Some(err),
                    });
                }
                metrics::record_broadcast(mode.as_str(), "rejected");
                Err(err)
            }
            Err(e) => {
                metrics::record_broadcast(mode.as_str(), "failed");
                Err(e)
            }
        }
    }
}

/// Map a node error to the most specific error variant.
fn classify_rejection(
    tx: &SignedTransaction,
    transaction_id: &str,
    now: NaiveDateTime,
    code: i64,
    message: String,
    data: Option<Value>,
) -> BlockchainError {
    let lower = message.to_ascii_lowercase();
    let name = data
        .as_ref()
        .and_then(|d| d.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_lowercase();

    if lower.contains("duplicate") || name.contains("duplicate") {
        BlockchainError::DuplicateTransaction(transaction_id.to_string())
    } else if lower.contains("irreversible") {
        BlockchainError::AlreadyIrreversible(transaction_id.to_string())
    } else if lower.contains("expir") || name.contains("expir") {
        BlockchainError::ExpiredTransaction {
            expiration: tx.expiration(),
            now,
        }
    } else if is_missing_authority(&message, data.as_ref()) {
        BlockchainError::VerificationFailure(message)
    } else {
        BlockchainError::NodeRejection { code, message, data }
    }
}
