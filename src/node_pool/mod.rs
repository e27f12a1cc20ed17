//! Node selection subsystem.
//!
//! # Data Flow
//! ```text
//! RpcTransport asks for a node
//!     → pool.rs (filter skipped nodes)
//!     → Apply selection strategy:
//!         - round_robin.rs (stay on a node until it fails, then rotate)
//!         - lowest_latency.rs (fewest failures, then fastest)
//!     → node.rs (call outcome updates counters)
//! ```
//!
//! # Design Decisions
//! - Health only changes from real call outcomes; nothing polls in the background
//! - A skipped node stays in the pool and comes back on `NodePool::reset`
//! - Counters are atomics so one pool can serve concurrent callers

pub mod lowest_latency;
pub mod node;
pub mod pool;
pub mod round_robin;

use std::fmt::Debug;
use std::sync::Arc;

pub use lowest_latency::LowestLatency;
pub use node::{normalize_url, Node};
pub use pool::NodePool;
pub use round_robin::RoundRobin;

/// Picks the next node among the ones still eligible.
pub trait SelectionStrategy: Debug + Send + Sync {
    /// Choose a node with fewer than `max_failures` consecutive failures.
    fn select(&self, nodes: &[Arc<Node>], max_failures: u32) -> Option<Arc<Node>>;

    /// Called after `failed` recorded a transport failure.
    fn on_failure(&self, _nodes: &[Arc<Node>], _failed: &Node) {}
}
