//! Configuration schema definitions.
//!
//! Every section derives Serde traits and falls back to defaults, so an empty
//! TOML file is a valid mainnet configuration.

use serde::{Deserialize, Serialize};

use crate::blockchain::types::{BlockchainResult, ChainId};

/// Public Hive API nodes used when no node list is configured.
pub const DEFAULT_NODES: &[&str] = &[
    "https://api.hive.blog",
    "https://api.openhive.network",
    "https://anyx.io",
    "https://hived.privex.io",
    "https://rpc.ausbit.dev",
    "https://techcoderx.com",
    "https://rpc.ecency.com",
    "https://hive.roelandp.nl",
    "https://hived.emre.sh",
    "https://api.deathwing.me",
    "https://api.c0ff33a.uk",
    "https://hive-api.arcange.eu",
];

/// Root configuration for the client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HiveConfig {
    /// Candidate nodes and selection policy.
    pub nodes: NodesConfig,

    /// Per-call timeout and retry budget.
    pub rpc: RpcConfig,

    /// Network selection.
    pub chain: ChainConfig,

    /// Transaction building defaults.
    pub transactions: TransactionConfig,

    /// Broadcast defaults.
    pub broadcast: BroadcastConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Node selection strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStrategy {
    /// Stay on one node until it fails, then move to the next.
    #[default]
    RoundRobin,
    /// Prefer the node with the fewest failures, then the lowest latency.
    LowestLatency,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodesConfig {
    /// Node URLs in preference order. A missing scheme means `https://`.
    pub urls: Vec<String>,

    /// Consecutive failures after which a node is skipped.
    pub max_failures: u32,

    pub strategy: NodeStrategy,
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            urls: DEFAULT_NODES.iter().map(|s| s.to_string()).collect(),
            max_failures: 3,
            strategy: NodeStrategy::RoundRobin,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Deadline for a single attempt, in seconds.
    pub timeout_secs: u64,

    /// Retries after the first attempt; `retries + 1` calls at most.
    pub retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    pub network: Network,

    /// 64-hex chain id; overrides `network` when set.
    pub chain_id: Option<String>,

    /// How long fetched chain state may be reused, in milliseconds.
    /// 0 fetches fresh state for every build.
    pub reuse_window_ms: u64,
}

impl ChainConfig {
    /// Chain id in effect: the explicit override, else the network's id.
    pub fn resolve_chain_id(&self) -> BlockchainResult<ChainId> {
        match &self.chain_id {
            Some(hex) => hex.parse(),
            None => Ok(match self.network {
                Network::Mainnet => ChainId::mainnet(),
                Network::Testnet => ChainId::testnet(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Seconds between head block time and expiration.
    pub expiration_secs: u32,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self { expiration_secs: 60 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Wait for block inclusion.
    pub synchronous: bool,

    /// Raise duplicate and already-irreversible rejections instead of
    /// returning them in the result.
    pub strict: bool,

    /// Log soft rejections at warn level instead of debug.
    pub warning: bool,

    /// Run authority verification before every broadcast.
    pub verify_before_broadcast: bool,

    /// Accept a locally satisfied verdict without asking the node.
    pub trust_local_verification: bool,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            synchronous: false,
            strict: true,
            warning: false,
            verify_before_broadcast: false,
            trust_local_verification: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: HiveConfig = toml::from_str("").unwrap();
        assert_eq!(config.nodes.urls.len(), DEFAULT_NODES.len());
        assert_eq!(config.nodes.max_failures, 3);
        assert_eq!(config.rpc.retries, 3);
        assert_eq!(config.transactions.expiration_secs, 60);
        assert!(config.broadcast.strict);
        assert_eq!(config.chain.resolve_chain_id().unwrap(), ChainId::mainnet());
    }

    #[test]
    fn test_partial_sections() {
        let config: HiveConfig = toml::from_str(
            r#"
            [nodes]
            urls = ["api.hive.blog"]
            strategy = "lowest_latency"

            [chain]
            network = "testnet"

            [broadcast]
            strict = false
            "#,
        )
        .unwrap();

        assert_eq!(config.nodes.urls, vec!["api.hive.blog"]);
        assert_eq!(config.nodes.strategy, NodeStrategy::LowestLatency);
        assert_eq!(config.nodes.max_failures, 3);
        assert_eq!(config.chain.resolve_chain_id().unwrap(), ChainId::testnet());
        assert!(!config.broadcast.strict);
        assert!(!config.broadcast.synchronous);
    }

    #[test]
    fn test_chain_id_override_wins() {
        let chain = ChainConfig {
            network: Network::Testnet,
            chain_id: Some("beeab0de00000000000000000000000000000000000000000000000000000000".into()),
            reuse_window_ms: 0,
        };
        assert_eq!(chain.resolve_chain_id().unwrap(), ChainId::mainnet());
    }
}
