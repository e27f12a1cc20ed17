//! Authority verification without broadcasting.
//!
//! # Data Flow
//! ```text
//! SignedTransaction
//!     → recover public keys from signatures (local)
//!     → map keys to roles through the KeyStore
//!         - some operation not covered   → false, no network call
//!         - unknown signer               → ask the node
//!         - every operation covered      → ask the node (unless trusted)
//!     → condenser_api.verify_authority
//! ```
//!
//! # Design Decisions
//! - The local check is an optimization only; on-chain authorities can be
//!   weighted or multi-sig, so a local "yes" is confirmed by the node by default

use serde_json::Value;
use std::sync::Arc;

use crate::blockchain::transaction::SignedTransaction;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId};
use crate::blockchain::wallet::{KeyStore, Role};
use crate::rpc::{Api, Params, RpcClient};

/// Outcome of the key-only check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalVerdict {
    /// Every operation is covered by a known signing key.
    Satisfied,
    /// Known signers cannot cover this operation.
    Unsatisfied {
        index: usize,
        operation: String,
        role: Role,
    },
    /// A signer is not in the key store; only the node can decide.
    Unresolved,
}

pub struct AuthorityVerifier {
    rpc: Arc<dyn RpcClient>,
    chain_id: ChainId,
    trust_local: bool,
}

impl AuthorityVerifier {
    pub fn new(rpc: Arc<dyn RpcClient>, chain_id: ChainId) -> Self {
        Self {
            rpc,
            chain_id,
            trust_local: false,
        }
    }

    /// Accept a local `Satisfied` verdict without asking the node.
    pub fn trust_local(mut self, trust: bool) -> Self {
        self.trust_local = trust;
        self
    }

    /// Check signatures against the roles of keys the store knows.
    pub fn verify_local(&self, tx: &SignedTransaction, keys: &KeyStore) -> LocalVerdict {
        let digest = tx.digest(&self.chain_id);

        let mut roles = Vec::with_capacity(tx.signatures.len());
        for signature in &tx.signatures {
            let role = signature
                .recover(&digest)
                .ok()
                .and_then(|public_key| keys.role_of(&public_key));
            match role {
                Some(role) => roles.push(role),
                None => return LocalVerdict::Unresolved,
            }
        }

        for (index, op) in tx.operations().iter().enumerate() {
            let required = op.required_role();
            if !roles.iter().any(|r| r.satisfies(required)) {
                return LocalVerdict::Unsatisfied {
                    index,
                    operation: op.name().to_string(),
                    role: required,
                };
            }
        }
        LocalVerdict::Satisfied
    }

    /// True if the signatures satisfy every required authority.
    pub async fn verify(&self, tx: &SignedTransaction, keys: &KeyStore) -> BlockchainResult<bool> {
        match self.verify_local(tx, keys) {
            LocalVerdict::Unsatisfied {
                index,
                operation,
                role,
            } => {
                tracing::info!(
                    tx_id = %tx.id(),
                    index,
                    operation = %operation,
                    role = %role,
                    "Signatures do not cover required authority"
                );
                Ok(false)
            }
            LocalVerdict::Satisfied if self.trust_local => Ok(true),
            LocalVerdict::Satisfied | LocalVerdict::Unresolved => self.verify_remote(tx).await,
        }
    }

    /// Ask the node to check the transaction against on-chain authorities.
    pub async fn verify_remote(&self, tx: &SignedTransaction) -> BlockchainResult<bool> {
        let params = vec![serde_json::to_value(tx)
            .map_err(|e| BlockchainError::InvalidOperation(format!("transaction JSON: {}", e)))?];

        match self
            .rpc
            .call(&Api::Condenser.method("verify_authority"), Params::Positional(params))
            .await
        {
            Ok(Value::Bool(valid)) => Ok(valid),
            Ok(other) => Err(BlockchainError::MalformedResponse(format!(
                "verify_authority returned {}",
                other
            ))),
            Err(BlockchainError::NodeRejection { message, data, .. })
                if is_missing_authority(&message, data.as_ref()) =>
            {
                tracing::debug!(tx_id = %tx.id(), error = %message, "Node reports missing authority");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// Node error text or exception name pointing at missing signatures.
pub(crate) fn is_missing_authority(message: &str, data: Option<&Value>) -> bool {
    let message = message.to_ascii_lowercase();
    if message.contains("missing") && message.contains("authority") {
        return true;
    }
    data.and_then(|d| d.get("name"))
        .and_then(Value::as_str)
        .is_some_and(|name| name.starts_with("tx_missing_") || name.contains("missing_auth"))
}
