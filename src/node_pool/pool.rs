//! Node pool management.
//!
//! # Responsibilities
//! - Hold the ordered candidate list for a session
//! - Apply the configured selection strategy
//! - Translate call outcomes into node health and rotation

use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::{NodeStrategy, NodesConfig};
use crate::node_pool::{normalize_url, LowestLatency, Node, RoundRobin, SelectionStrategy};
use crate::observability::metrics;

/// Ordered candidate nodes with failure-driven rotation.
#[derive(Debug)]
pub struct NodePool {
    nodes: Vec<Arc<Node>>,
    strategy: Box<dyn SelectionStrategy>,
    max_failures: u32,
}

impl NodePool {
    /// Build a pool from raw URLs. Invalid entries are an error; an empty list is too.
    pub fn new(
        urls: &[String],
        max_failures: u32,
        strategy: Box<dyn SelectionStrategy>,
    ) -> BlockchainResult<Self> {
        let mut nodes = Vec::with_capacity(urls.len());
        for raw in urls {
            let url = normalize_url(raw).map_err(BlockchainError::InvalidOperation)?;
            if nodes.iter().any(|n: &Arc<Node>| n.url() == &url) {
                tracing::debug!(url = %url, "Ignoring duplicate node");
                continue;
            }
            nodes.push(Arc::new(Node::new(url)));
        }

        if nodes.is_empty() {
            return Err(BlockchainError::NoHealthyNodes);
        }

        Ok(Self {
            nodes,
            strategy,
            max_failures: max_failures.max(1),
        })
    }

    pub fn from_config(config: &NodesConfig) -> BlockchainResult<Self> {
        let strategy: Box<dyn SelectionStrategy> = match config.strategy {
            NodeStrategy::RoundRobin => Box::new(RoundRobin::new()),
            NodeStrategy::LowestLatency => Box::new(LowestLatency::new()),
        };
        let pool = Self::new(&config.urls, config.max_failures, strategy)?;

        tracing::info!(
            nodes = pool.nodes.len(),
            max_failures = pool.max_failures,
            strategy = ?config.strategy,
            "Node pool initialized"
        );
        Ok(pool)
    }

    /// Current best candidate, or `None` when every node is skipped.
    pub fn select(&self) -> Option<Arc<Node>> {
        let selected = self.strategy.select(&self.nodes, self.max_failures);
        if selected.is_none() {
            tracing::warn!(nodes = self.nodes.len(), "All nodes skipped");
        }
        selected
    }

    /// Record a transport failure and rotate away from `node` if needed.
    pub fn report_failure(&self, node: &Node) {
        let failures = node.mark_failure();
        self.strategy.on_failure(&self.nodes, node);

        if failures == self.max_failures {
            tracing::warn!(
                url = %node.url(),
                consecutive_failures = failures,
                "Node skipped for the rest of the session"
            );
            metrics::record_node_available(node.url().as_str(), false);
        } else {
            tracing::debug!(url = %node.url(), consecutive_failures = failures, "Node failure");
        }
    }

    /// Record an answered call.
    pub fn report_success(&self, node: &Node, latency: Duration) {
        let was_skipped = !node.is_available(self.max_failures);
        node.mark_success(latency);
        if was_skipped {
            metrics::record_node_available(node.url().as_str(), true);
        }
    }

    /// Make every skipped node selectable again.
    pub fn reset(&self) {
        for node in &self.nodes {
            node.reset();
            metrics::record_node_available(node.url().as_str(), true);
        }
        tracing::info!(nodes = self.nodes.len(), "Node pool reset");
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    pub fn available_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.is_available(self.max_failures))
            .count()
    }

    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }
}
