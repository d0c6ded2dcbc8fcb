//! Per-caller request throttling with progressive penalties.
//!
//! Every caller identity accumulates a request count inside a fixed window.
//! Exceeding the threshold puts the caller into a cooldown; violating the
//! threshold again while cooling down escalates to a tempban. All state
//! lives in the shared counter store and expires via TTL, so no background
//! sweeping is needed.

mod config;
mod limiter;

pub use config::RateLimitConfig;
pub use limiter::{RateKeys, RateLimiter};

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Request may proceed
    Allow,
    /// Caller is in the short penalty state
    Cooldown,
    /// Caller is in the long penalty state
    Tempban,
}

impl Decision {
    /// Whether the request may proceed.
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Cooldown => "cooldown",
            Decision::Tempban => "tempban",
        }
    }
}
