//! Transaction signing.
//!
//! Every operation's required role is checked against the [`KeyStore`]
//! before any signature is produced, so a transaction is either fully
//! covered or left untouched.

use std::collections::BTreeSet;

use crate::blockchain::transaction::{SignedTransaction, UnsignedTransaction};
use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId};
use crate::blockchain::wallet::{KeyStore, Role};

/// Produces deterministic signatures bound to one chain id.
#[derive(Debug, Clone, Copy)]
pub struct Signer {
    chain_id: ChainId,
}

impl Signer {
    pub fn new(chain_id: ChainId) -> Self {
        Self { chain_id }
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    /// Sign a freshly built transaction.
    pub fn sign(
        &self,
        unsigned: UnsignedTransaction,
        keys: &KeyStore,
    ) -> BlockchainResult<SignedTransaction> {
        let mut signed = SignedTransaction::new(unsigned);
        self.sign_into(&mut signed, keys)?;
        Ok(signed)
    }

    /// Add signatures from `keys` to an already (partially) signed transaction.
    ///
    /// Returns the number of new signatures appended.
    pub fn sign_into(
        &self,
        transaction: &mut SignedTransaction,
        keys: &KeyStore,
    ) -> BlockchainResult<usize> {
        let roles = required_roles(&transaction.transaction, keys)?;
        let digest = transaction.digest(&self.chain_id);

        let mut added = 0;
        for role in roles {
            for entry in keys.signing_keys(role) {
                let signature = entry.key().sign_digest(&digest)?;
                if transaction.push_signature(signature) {
                    added += 1;
                    tracing::debug!(
                        role = %entry.role(),
                        public_key = %entry.public_key(),
                        "Signature added"
                    );
                }
            }
        }

        tracing::info!(
            tx_id = %transaction.id(),
            signatures = transaction.signatures.len(),
            "Transaction signed"
        );
        Ok(added)
    }
}

/// Distinct roles needed by the transaction, failing on the first operation
/// no key can cover or on a posting/active mix.
fn required_roles(tx: &UnsignedTransaction, keys: &KeyStore) -> BlockchainResult<BTreeSet<Role>> {
    let mut roles = BTreeSet::new();
    for (index, op) in tx.operations.iter().enumerate() {
        let role = op.required_role();
        if !keys.can_sign(role) {
            tracing::warn!(
                index,
                operation = op.name(),
                role = %role,
                "No key covers required authority"
            );
            return Err(BlockchainError::MissingAuthority {
                index,
                operation: op.name().to_string(),
                role,
            });
        }
        roles.insert(role);
    }

    // The chain refuses posting operations next to active or owner ones
    if roles.contains(&Role::Posting) && roles.iter().any(|r| *r > Role::Posting) {
        tracing::warn!(tx_id = %tx.id(), "Posting and higher-authority operations mixed");
        return Err(BlockchainError::InvalidOperation(
            "posting operations cannot share a transaction with active or owner operations"
                .to_string(),
        ));
    }
    Ok(roles)
}
