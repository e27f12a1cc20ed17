//! Chain-specific types and error definitions.

use chrono::NaiveDateTime;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::blockchain::wallet::Role;

/// Chain id of Hive mainnet.
pub const MAINNET_CHAIN_ID: &str =
    "beeab0de00000000000000000000000000000000000000000000000000000000";

/// Chain id of the public Hive testnet.
pub const TESTNET_CHAIN_ID: &str =
    "18dcf0a285365fc58b71f18b3d3fec954aa0c141c44e4e5cb4cf777b9eab274e";

/// Longest expiration horizon a node accepts (HIVE_MAX_TIME_UNTIL_EXPIRATION).
pub const MAX_EXPIRATION_SECS: u32 = 3600;

/// Timestamp format used on the wire (UTC, no zone suffix).
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// 32-byte chain id, bound into every transaction digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub [u8; 32]);

impl ChainId {
    pub const MAINNET: ChainId = ChainId({
        let mut bytes = [0u8; 32];
        bytes[0] = 0xbe;
        bytes[1] = 0xea;
        bytes[2] = 0xb0;
        bytes[3] = 0xde;
        bytes
    });

    pub const TESTNET: ChainId = ChainId([
        0x18, 0xdc, 0xf0, 0xa2, 0x85, 0x36, 0x5f, 0xc5, 0x8b, 0x71, 0xf1, 0x8b, 0x3d, 0x3f,
        0xec, 0x95, 0x4a, 0xa0, 0xc1, 0x41, 0xc4, 0x4e, 0x4e, 0x5c, 0xb4, 0xcf, 0x77, 0x7b,
        0x9e, 0xab, 0x27, 0x4e,
    ]);

    pub fn mainnet() -> Self {
        Self::MAINNET
    }

    pub fn testnet() -> Self {
        Self::TESTNET
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for ChainId {
    type Err = BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| BlockchainError::InvalidOperation(format!("chain id is not hex: {}", e)))?;
        let array: [u8; 32] = bytes.try_into().map_err(|_| {
            BlockchainError::InvalidOperation("chain id must be 32 bytes".to_string())
        })?;
        Ok(Self(array))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Snapshot of the dynamic global properties needed to build a transaction header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainState {
    pub chain_id: ChainId,
    pub head_block_number: u32,
    /// 20-byte block id of the head block.
    pub head_block_id: [u8; 20],
    /// Head block time as reported by the node (UTC).
    pub time: NaiveDateTime,
}

impl ChainState {
    /// Low 16 bits of the head block number.
    pub fn ref_block_num(&self) -> u16 {
        (self.head_block_number & 0xFFFF) as u16
    }

    /// Bytes 4..8 of the head block id, read little-endian.
    pub fn ref_block_prefix(&self) -> u32 {
        let id = &self.head_block_id;
        u32::from_le_bytes([id[4], id[5], id[6], id[7]])
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, Error)]
pub enum BlockchainError {
    /// Network failure or timeout that survived every retry.
    #[error("transport error after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    /// Every node in the pool is currently skipped.
    #[error("no healthy nodes available")]
    NoHealthyNodes,

    /// Well-formed JSON-RPC error returned by a node.
    #[error("node rejected request (code {code}): {message}")]
    NodeRejection {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// No key in the store covers the role an operation needs.
    #[error("operation #{index} ({operation}) requires {role} authority but no key covers it")]
    MissingAuthority {
        index: usize,
        operation: String,
        role: Role,
    },

    /// Expiration elapsed before the transaction reached the network.
    #[error("transaction expired at {expiration} (now {now})")]
    ExpiredTransaction {
        expiration: NaiveDateTime,
        now: NaiveDateTime,
    },

    /// Node already knows this transaction id.
    #[error("duplicate transaction {0}")]
    DuplicateTransaction(String),

    /// Transaction is already part of an irreversible block.
    #[error("transaction {0} is already irreversible")]
    AlreadyIrreversible(String),

    /// Signature set does not satisfy the required authorities.
    #[error("authority verification failed: {0}")]
    VerificationFailure(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("expiration of {requested}s is outside 1..={max}s")]
    InvalidExpiration { requested: u32, max: u32 },

    /// Malformed WIF, public key or signature material.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The node answered but the payload could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Node serves a different chain than the one configured.
    #[error("chain id mismatch: expected {expected}, node reports {actual}")]
    ChainMismatch { expected: ChainId, actual: ChainId },
}

impl BlockchainError {
    /// Transport-class failures may succeed against another node.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::NoHealthyNodes)
    }

    /// Rejections that non-strict broadcasting reports instead of raising.
    pub fn is_soft_rejection(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTransaction(_) | Self::AlreadyIrreversible(_)
        )
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;
