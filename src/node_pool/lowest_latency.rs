//! Latency-aware node selection.

use std::sync::Arc;

use crate::node_pool::{Node, SelectionStrategy};

/// Selects the available node with the fewest consecutive failures, breaking
/// ties by last observed latency. Untried nodes report 0ms and are tried early.
#[derive(Debug, Default)]
pub struct LowestLatency;

impl LowestLatency {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionStrategy for LowestLatency {
    fn select(&self, nodes: &[Arc<Node>], max_failures: u32) -> Option<Arc<Node>> {
        // On a full tie the first node in list order wins
        nodes
            .iter()
            .filter(|n| n.is_available(max_failures))
            .min_by_key(|n| (n.consecutive_failures(), n.last_latency_ms()))
            .cloned()
    }
}
