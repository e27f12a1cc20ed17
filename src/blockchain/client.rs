//! High-level Hive client.
//!
//! # Responsibilities
//! - Wire the node pool, transport, chain state, builder, signer, verifier
//!   and broadcaster from one [`HiveConfig`]
//! - Expose raw calls next to the build → sign → verify → broadcast flow
//! - Check that the nodes serve the configured chain
//!
//! # Data Flow
//! ```text
//! submit(ops, keys, options)
//!     → prepare: ChainStateCache → TransactionBuilder → Signer
//!     → verify (optional): AuthorityVerifier
//!     → broadcast: Broadcaster → RpcTransport → NodePool
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::broadcaster::{BroadcastResult, Broadcaster};
use crate::blockchain::chain_state::{ChainStateCache, ChainStateSource};
use crate::blockchain::operation::Operation;
use crate::blockchain::signer::Signer;
use crate::blockchain::transaction::{SignedTransaction, TransactionBuilder};
use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId, ChainState};
use crate::blockchain::verifier::AuthorityVerifier;
use crate::blockchain::wallet::KeyStore;
use crate::config::HiveConfig;
use crate::node_pool::NodePool;
use crate::rpc::transport::policy_from;
use crate::rpc::{Api, Connector, HttpConnector, Params, RpcClient, RpcTransport};

/// Per-submission broadcast settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastOptions {
    pub synchronous: bool,
    pub strict: bool,
    pub expiration_secs: u32,
    /// Run authority verification before broadcasting.
    pub verify: bool,
}

impl BroadcastOptions {
    pub fn from_config(config: &HiveConfig) -> Self {
        Self {
            synchronous: config.broadcast.synchronous,
            strict: config.broadcast.strict,
            expiration_secs: config.transactions.expiration_secs,
            verify: config.broadcast.verify_before_broadcast,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    chain_id: String,
}

/// Client for one Hive network.
pub struct HiveClient {
    config: HiveConfig,
    chain_id: ChainId,
    transport: Arc<RpcTransport>,
    chain_state: Arc<ChainStateCache>,
    builder: TransactionBuilder,
    signer: Signer,
    verifier: AuthorityVerifier,
    broadcaster: Broadcaster,
}

impl HiveClient {
    /// Client over HTTP to the configured nodes.
    pub fn new(config: HiveConfig) -> BlockchainResult<Self> {
        let connect_timeout = Duration::from_secs(config.rpc.timeout_secs);
        let connector = Arc::new(HttpConnector::new(connect_timeout)?);
        Self::with_connector(config, connector)
    }

    /// Client with a custom connector, e.g. a test double.
    pub fn with_connector(
        config: HiveConfig,
        connector: Arc<dyn Connector>,
    ) -> BlockchainResult<Self> {
        let chain_id = config.chain.resolve_chain_id()?;
        let pool = Arc::new(NodePool::from_config(&config.nodes)?);
        let transport = Arc::new(RpcTransport::new(
            pool,
            connector,
            policy_from(&config),
            Duration::from_secs(config.rpc.timeout_secs),
        ));
        let rpc: Arc<dyn RpcClient> = transport.clone();

        let chain_state = Arc::new(ChainStateCache::new(
            rpc.clone(),
            chain_id,
            Duration::from_millis(config.chain.reuse_window_ms),
        ));
        let builder = TransactionBuilder::new(chain_state.clone());
        let verifier = AuthorityVerifier::new(rpc.clone(), chain_id)
            .trust_local(config.broadcast.trust_local_verification);
        let broadcaster = Broadcaster::new(rpc).with_warning(config.broadcast.warning);

        tracing::info!(
            chain_id = %chain_id,
            nodes = transport.pool().nodes().len(),
            "Hive client initialized"
        );

        Ok(Self {
            config,
            chain_id,
            transport,
            chain_state,
            builder,
            signer: Signer::new(chain_id),
            verifier,
            broadcaster,
        })
    }

    pub fn config(&self) -> &HiveConfig {
        &self.config
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    pub fn pool(&self) -> &Arc<NodePool> {
        self.transport.pool()
    }

    /// Make skipped nodes eligible again.
    pub fn reset_nodes(&self) {
        self.transport.pool().reset();
    }

    /// Raw JSON-RPC call, e.g. `call("condenser_api.get_accounts", ...)`.
    pub async fn call(&self, method: &str, params: Params) -> BlockchainResult<Value> {
        self.transport.call(method, params).await
    }

    /// Call with an explicit retry budget and timeout.
    pub async fn call_with(
        &self,
        method: &str,
        params: Params,
        retries: u32,
        timeout: Duration,
    ) -> BlockchainResult<Value> {
        self.transport.call_with(method, params, retries, timeout).await
    }

    pub async fn chain_state(&self) -> BlockchainResult<ChainState> {
        self.chain_state.current().await
    }

    /// Fail unless the node reports the configured chain id.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let value = self
            .call(&Api::Database.method("get_version"), Params::empty())
            .await?;
        let info: VersionInfo = serde_json::from_value(value)
            .map_err(|e| BlockchainError::MalformedResponse(format!("get_version: {}", e)))?;
        let actual: ChainId = info
            .chain_id
            .parse()
            .map_err(|e| BlockchainError::MalformedResponse(format!("get_version chain_id: {}", e)))?;

        if actual != self.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.chain_id,
                actual,
            });
        }
        Ok(())
    }

    /// Build and sign, without touching the network beyond chain state.
    pub async fn prepare(
        &self,
        operations: Vec<Operation>,
        keys: &KeyStore,
        expiration_secs: u32,
    ) -> BlockchainResult<SignedTransaction> {
        let unsigned = self.builder.build(operations, expiration_secs).await?;
        self.signer.sign(unsigned, keys)
    }

    /// Add signatures from another key store (multi-sig).
    pub fn cosign(&self, tx: &mut SignedTransaction, keys: &KeyStore) -> BlockchainResult<usize> {
        self.signer.sign_into(tx, keys)
    }

    pub async fn verify(&self, tx: &SignedTransaction, keys: &KeyStore) -> BlockchainResult<bool> {
        self.verifier.verify(tx, keys).await
    }

    pub async fn broadcast(
        &self,
        tx: &SignedTransaction,
        synchronous: bool,
        strict: bool,
    ) -> BlockchainResult<BroadcastResult> {
        self.broadcaster.broadcast(tx, synchronous, strict).await
    }

    /// Build, sign, optionally verify, then broadcast.
    pub async fn submit(
        &self,
        operations: Vec<Operation>,
        keys: &KeyStore,
        options: BroadcastOptions,
    ) -> BlockchainResult<BroadcastResult> {
        let tx = self.prepare(operations, keys, options.expiration_secs).await?;

        if options.verify && !self.verify(&tx, keys).await? {
            return Err(BlockchainError::VerificationFailure(format!(
                "signatures on {} do not satisfy the required authorities",
                tx.id()
            )));
        }

        self.broadcast(&tx, options.synchronous, options.strict).await
    }
}

impl std::fmt::Debug for HiveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HiveClient")
            .field("chain_id", &self.chain_id)
            .field("nodes", &self.config.nodes.urls)
            .field("timeout_secs", &self.config.rpc.timeout_secs)
            .finish()
    }
}
