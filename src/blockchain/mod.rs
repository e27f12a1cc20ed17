//! Hive chain subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (WIF keys)
//!     → wallet.rs (KeyStore, roles)
//!     → chain_state.rs (head block, time)
//!     → transaction.rs (build: ref block, expiration, operations)
//!     → signer.rs (role check, canonical signatures)
//!     → verifier.rs (local + node authority check)
//!     → broadcaster.rs (sync / async submit, rejection mapping)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables or explicit API calls
//! - Never log private keys; only public keys appear in logs
//! - Signing fails before producing any signature if a role is not covered

pub mod broadcaster;
pub mod chain_state;
pub mod client;
pub mod keys;
pub mod operation;
pub mod serializer;
pub mod signer;
pub mod transaction;
pub mod types;
pub mod verifier;
pub mod wallet;

pub use broadcaster::{BroadcastMode, BroadcastResult, Broadcaster};
pub use chain_state::{ChainStateCache, ChainStateSource};
pub use client::{BroadcastOptions, HiveClient};
pub use keys::{CompactSignature, PrivateKey, PublicKey};
pub use operation::{Asset, AssetSymbol, Operation};
pub use signer::Signer;
pub use transaction::{SignedTransaction, TransactionBuilder, UnsignedTransaction};
pub use types::{BlockchainError, BlockchainResult, ChainId, ChainState};
pub use verifier::{AuthorityVerifier, LocalVerdict};
pub use wallet::{KeyStore, Role};
