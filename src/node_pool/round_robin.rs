//! Round-robin node selection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::node_pool::{Node, SelectionStrategy};

/// Sticky round-robin: keeps returning the current node until it fails,
/// then moves the cursor to the next one in list order.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobin {
    fn select(&self, nodes: &[Arc<Node>], max_failures: u32) -> Option<Arc<Node>> {
        if nodes.is_empty() {
            return None;
        }

        let start = self.cursor.load(Ordering::Relaxed);
        let len = nodes.len();

        for i in 0..len {
            let index = (start + i) % len;
            let node = &nodes[index];
            if node.is_available(max_failures) {
                self.cursor.store(index, Ordering::Relaxed);
                return Some(node.clone());
            }
        }
        None
    }

    fn on_failure(&self, nodes: &[Arc<Node>], failed: &Node) {
        if nodes.is_empty() {
            return;
        }
        let current = self.cursor.load(Ordering::Relaxed) % nodes.len();
        if std::ptr::eq(nodes[current].as_ref(), failed) {
            let _ = self.cursor.compare_exchange(
                current,
                (current + 1) % nodes.len(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            );
        }
    }
}
