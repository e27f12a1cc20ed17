//! Hive JSON-RPC client library.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller
//!     │  call(method, params)          submit(ops, keys, options)
//!     ▼                                 │
//!   ┌──────────────┐   ┌──────────────────────────────────────────────┐
//!   │     rpc      │◀──│ blockchain                                    │
//!   │ transport +  │   │ chain_state → transaction → signer            │
//!   │ retry machine│   │            → verifier → broadcaster           │
//!   └──────┬───────┘   └──────────────────────────────────────────────┘
//!          ▼
//!   ┌──────────────┐
//!   │  node_pool   │  round robin / lowest latency, failure counters
//!   └──────┬───────┘
//!          ▼
//!     Hive API nodes (HTTP JSON-RPC 2.0)
//!
//!   cross-cutting: config, observability, resilience
//! ```

// Core subsystems
pub mod blockchain;
pub mod config;
pub mod node_pool;
pub mod rpc;

// Cross-cutting concerns
pub mod observability;
pub mod resilience;

pub use blockchain::{BlockchainError, BlockchainResult, BroadcastOptions, HiveClient};
pub use config::HiveConfig;
