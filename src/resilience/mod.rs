//! Resilience primitives for node calls.
//!
//! # Data Flow
//! ```text
//! RpcTransport::call
//!     → timeouts.rs (per-attempt deadline)
//!     → On transport failure: retries.rs (next state, backoff from backoff.rs)
//!     → NodePool rotation on the next Selecting state
//! ```
//!
//! # Design Decisions
//! - Every node call has a deadline
//! - Only transport failures are retried; node rejections end the call
//! - The retry loop is an explicit state machine, testable without a network

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{RetryEvent, RetryMachine, RetryPolicy, RetryState};
pub use timeouts::{with_deadline, DeadlineExceeded};
