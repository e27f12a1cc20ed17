//! Bounded retry state machine.
//!
//! # States
//! - Selecting: asking the node pool for a candidate
//! - Calling: request in flight against the selected node
//! - Retrying: waiting out the backoff before selecting again
//! - Exhausted: retry budget spent or no node left to try
//! - Finished: the node answered (result or rejection)
//!
//! # State Transitions
//! ```text
//! Selecting --NodeSelected--> Calling
//! Selecting --NoNodeAvailable--> Exhausted
//! Calling --Succeeded|Rejected--> Finished
//! Calling --TransportFailed--> Retrying   (attempt <= max_retries)
//! Calling --TransportFailed--> Exhausted  (budget spent)
//! Retrying --BackoffElapsed--> Selecting (attempt + 1)
//! ```
//!
//! # Design Decisions
//! - `max_retries = r` allows at most `r + 1` calls
//! - Rejections are terminal: a node that refused the request answered it
//! - Events that do not apply to the current state leave it unchanged

use std::time::Duration;

use crate::resilience::backoff::delay_after_failure;

/// Retry budget and backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Selecting { attempt: u32 },
    Calling { attempt: u32 },
    Retrying { attempt: u32, delay: Duration },
    Exhausted { attempts: u32 },
    Finished { attempts: u32 },
}

impl RetryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RetryState::Exhausted { .. } | RetryState::Finished { .. })
    }
}

/// Outcomes fed into the machine by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryEvent {
    NodeSelected,
    NoNodeAvailable,
    TransportFailed,
    Rejected,
    Succeeded,
    BackoffElapsed,
}

#[derive(Debug, Clone)]
pub struct RetryMachine {
    policy: RetryPolicy,
    state: RetryState,
}

impl RetryMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: RetryState::Selecting { attempt: 1 },
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Apply `event` and return the new state.
    pub fn advance(&mut self, event: RetryEvent) -> RetryState {
        let next = match (self.state, event) {
            (RetryState::Selecting { attempt }, RetryEvent::NodeSelected) => {
                RetryState::Calling { attempt }
            }
            (RetryState::Selecting { attempt }, RetryEvent::NoNodeAvailable) => {
                RetryState::Exhausted {
                    attempts: attempt - 1,
                }
            }
            (RetryState::Calling { attempt }, RetryEvent::Succeeded | RetryEvent::Rejected) => {
                RetryState::Finished { attempts: attempt }
            }
            (RetryState::Calling { attempt }, RetryEvent::TransportFailed) => {
                if attempt <= self.policy.max_retries {
                    RetryState::Retrying {
                        attempt,
                        delay: delay_after_failure(&self.policy, attempt),
                    }
                } else {
                    RetryState::Exhausted { attempts: attempt }
                }
            }
            (RetryState::Retrying { attempt, .. }, RetryEvent::BackoffElapsed) => {
                RetryState::Selecting {
                    attempt: attempt + 1,
                }
            }
            (state, event) => {
                tracing::trace!(?state, ?event, "Ignoring retry event");
                state
            }
        };

        self.state = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 10,
            max_delay_ms: 100,
        }
    }

    fn fail_once(machine: &mut RetryMachine) -> RetryState {
        machine.advance(RetryEvent::NodeSelected);
        machine.advance(RetryEvent::TransportFailed)
    }

    #[test]
    fn test_success_first_try() {
        let mut machine = RetryMachine::new(policy(3));
        assert_eq!(machine.advance(RetryEvent::NodeSelected), RetryState::Calling { attempt: 1 });
        assert_eq!(
            machine.advance(RetryEvent::Succeeded),
            RetryState::Finished { attempts: 1 }
        );
        assert!(machine.state().is_terminal());
    }

    #[test]
    fn test_retries_bounded() {
        let mut machine = RetryMachine::new(policy(2));

        for attempt in 1..=2 {
            match fail_once(&mut machine) {
                RetryState::Retrying { attempt: a, delay } => {
                    assert_eq!(a, attempt);
                    assert!(delay >= Duration::from_millis(10));
                }
                other => panic!("expected Retrying, got {:?}", other),
            }
            machine.advance(RetryEvent::BackoffElapsed);
        }

        assert_eq!(fail_once(&mut machine), RetryState::Exhausted { attempts: 3 });
        assert_eq!(machine.policy().max_attempts(), 3);
    }

    #[test]
    fn test_rejection_is_terminal() {
        let mut machine = RetryMachine::new(policy(5));
        machine.advance(RetryEvent::NodeSelected);
        assert_eq!(
            machine.advance(RetryEvent::Rejected),
            RetryState::Finished { attempts: 1 }
        );
        // Later events do nothing
        assert_eq!(
            machine.advance(RetryEvent::BackoffElapsed),
            RetryState::Finished { attempts: 1 }
        );
    }

    #[test]
    fn test_no_node_available() {
        let mut machine = RetryMachine::new(policy(3));
        assert_eq!(
            machine.advance(RetryEvent::NoNodeAvailable),
            RetryState::Exhausted { attempts: 0 }
        );

        let mut machine = RetryMachine::new(policy(3));
        fail_once(&mut machine);
        machine.advance(RetryEvent::BackoffElapsed);
        assert_eq!(
            machine.advance(RetryEvent::NoNodeAvailable),
            RetryState::Exhausted { attempts: 1 }
        );
    }

    #[test]
    fn test_zero_retries() {
        let mut machine = RetryMachine::new(policy(0));
        assert_eq!(fail_once(&mut machine), RetryState::Exhausted { attempts: 1 });
    }
}
