//! A single RPC node and its health counters.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

/// One candidate endpoint.
///
/// Counters only move on real call outcomes.
#[derive(Debug)]
pub struct Node {
    url: Url,
    /// Latency of the last successful call; 0 until one succeeds.
    last_latency_ms: AtomicU64,
    consecutive_failures: AtomicU32,
    total_failures: AtomicU64,
    total_successes: AtomicU64,
}

impl Node {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            last_latency_ms: AtomicU64::new(0),
            consecutive_failures: AtomicU32::new(0),
            total_failures: AtomicU64::new(0),
            total_successes: AtomicU64::new(0),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn last_latency_ms(&self) -> u64 {
        self.last_latency_ms.load(Ordering::Relaxed)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    pub fn total_failures(&self) -> u64 {
        self.total_failures.load(Ordering::Relaxed)
    }

    pub fn total_successes(&self) -> u64 {
        self.total_successes.load(Ordering::Relaxed)
    }

    /// Selectable while below the failure threshold.
    pub fn is_available(&self, max_failures: u32) -> bool {
        self.consecutive_failures() < max_failures
    }

    /// Record an answered call and its latency.
    pub fn mark_success(&self, latency: Duration) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.total_successes.fetch_add(1, Ordering::Relaxed);
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.last_latency_ms.store(ms, Ordering::Relaxed);
    }

    /// Record a transport failure. Returns the new consecutive count.
    pub fn mark_failure(&self) -> u32 {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Clear the consecutive failure count; totals are kept.
    pub fn reset(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }
}

/// Parse a configured node address, defaulting to `https://` when the scheme
/// is missing (`api.hive.blog` → `https://api.hive.blog/`).
pub fn normalize_url(raw: &str) -> Result<Url, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("node URL is empty".to_string());
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| format!("invalid node URL '{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        _ => Err(format!("unsupported node URL '{}'", raw)),
    }
}
