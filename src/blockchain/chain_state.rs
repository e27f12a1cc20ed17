//! Chain state needed for transaction headers.
//!
//! # Responsibilities
//! - Fetch dynamic global properties (head block number, id, time)
//! - Attach the configured chain id
//! - Optionally reuse a snapshot for a short, explicit window
//!
//! # Design Decisions
//! - Fresh fetch per build by default; the head moves every few seconds
//! - The cached snapshot is swapped atomically so readers never block

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::blockchain::transaction::hive_time;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId, ChainState};
use crate::rpc::{Api, Params, RpcClient};

/// Supplies chain state to the transaction builder.
#[async_trait]
pub trait ChainStateSource: Send + Sync {
    async fn current(&self) -> BlockchainResult<ChainState>;
}

#[derive(Debug, Deserialize)]
struct DynamicGlobalProperties {
    head_block_number: u32,
    head_block_id: String,
    #[serde(with = "hive_time")]
    time: NaiveDateTime,
}

struct Snapshot {
    state: ChainState,
    fetched_at: Instant,
}

/// Fetches [`ChainState`] through an [`RpcClient`].
pub struct ChainStateCache {
    rpc: Arc<dyn RpcClient>,
    chain_id: ChainId,
    reuse_window: Duration,
    cached: ArcSwapOption<Snapshot>,
}

impl ChainStateCache {
    /// `reuse_window` of zero fetches on every call.
    pub fn new(rpc: Arc<dyn RpcClient>, chain_id: ChainId, reuse_window: Duration) -> Self {
        Self {
            rpc,
            chain_id,
            reuse_window,
            cached: ArcSwapOption::empty(),
        }
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    /// Drop any reusable snapshot.
    pub fn invalidate(&self) {
        self.cached.store(None);
    }

    /// Always hits the node, regardless of the reuse window.
    pub async fn fetch(&self) -> BlockchainResult<ChainState> {
        let value = self
            .rpc
            .call(
                &Api::Condenser.method("get_dynamic_global_properties"),
                Params::empty(),
            )
            .await?;

        let props: DynamicGlobalProperties = serde_json::from_value(value).map_err(|e| {
            BlockchainError::MalformedResponse(format!("dynamic global properties: {}", e))
        })?;
        let state = ChainState {
            chain_id: self.chain_id,
            head_block_number: props.head_block_number,
            head_block_id: parse_block_id(&props.head_block_id)?,
            time: props.time,
        };

        tracing::debug!(
            head_block_number = state.head_block_number,
            time = %state.time,
            "Chain state fetched"
        );

        if !self.reuse_window.is_zero() {
            self.cached.store(Some(Arc::new(Snapshot {
                state: state.clone(),
                fetched_at: Instant::now(),
            })));
        }
        Ok(state)
    }

    fn reusable(&self) -> Option<ChainState> {
        if self.reuse_window.is_zero() {
            return None;
        }
        let guard = self.cached.load();
        let snapshot = guard.as_ref()?;
        (snapshot.fetched_at.elapsed() < self.reuse_window).then(|| snapshot.state.clone())
    }
}

#[async_trait]
impl ChainStateSource for ChainStateCache {
    async fn current(&self) -> BlockchainResult<ChainState> {
        match self.reusable() {
            Some(state) => Ok(state),
            None => self.fetch().await,
        }
    }
}

fn parse_block_id(hex_id: &str) -> BlockchainResult<[u8; 20]> {
    let bytes = hex::decode(hex_id)
        .map_err(|e| BlockchainError::MalformedResponse(format!("head_block_id: {}", e)))?;
    bytes.try_into().map_err(|_| {
        BlockchainError::MalformedResponse("head_block_id must be 20 bytes".to_string())
    })
}
