//! Resilience patterns for careguard-runtime.
//!
//! Provider deadlines are enforced by the orchestrator. This module holds
//! the optional retry policy for throttled or timed-out calls.

mod retry;

pub use retry::RetryPolicy;
