//! Backoff between RPC attempts.
//!
//! After the n-th failed attempt the transport waits
//! `base_delay_ms * 2^(n-1)`, capped at `max_delay_ms`, plus up to 10% jitter
//! so callers sharing a node list do not retry in lockstep.

use rand::Rng;
use std::time::Duration;

use crate::resilience::retries::RetryPolicy;

/// Delay to wait after `failed_attempt` (1-based) failed under `policy`.
pub fn delay_after_failure(policy: &RetryPolicy, failed_attempt: u32) -> Duration {
    let capped = nominal_delay_ms(policy, failed_attempt);
    let jitter = match capped / 10 {
        0 => 0,
        spread => rand::thread_rng().gen_range(0..spread),
    };
    Duration::from_millis(capped + jitter)
}

/// Delay without jitter.
fn nominal_delay_ms(policy: &RetryPolicy, failed_attempt: u32) -> u64 {
    let Some(doublings) = failed_attempt.checked_sub(1) else {
        return 0;
    };
    let factor = 1u64.checked_shl(doublings).unwrap_or(u64::MAX);
    policy
        .base_delay_ms
        .saturating_mul(factor)
        .min(policy.max_delay_ms)
}
