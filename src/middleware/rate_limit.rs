//! Rate limiting middleware
//!
//! Keyed limiter guarding the public certificate validation endpoint.

use std::num::NonZeroU32;
use std::sync::Arc;
use governor::{
    clock::DefaultClock,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use tracing::warn;
use crate::utils::errors::{AdmissioError, Result};

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Per-key request limiter
#[derive(Clone)]
pub struct RateLimitService {
    limiter: Arc<KeyedLimiter>,
    per_minute: u32,
}

impl RateLimitService {
    /// Create a limiter allowing `per_minute` requests per key
    pub fn new(per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute.max(1)).expect("clamped above zero"));
        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            per_minute: per_minute.max(1),
        }
    }

    /// Check a request against the key's budget
    pub fn check(&self, key: &str) -> Result<()> {
        match self.limiter.check_key(&key.to_string()) {
            Ok(_) => Ok(()),
            Err(_) => {
                warn!(key = %key, limit = self.per_minute, "Rate limit exceeded");
                Err(AdmissioError::RateLimitExceeded)
            }
        }
    }
}

impl std::fmt::Debug for RateLimitService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitService")
            .field("per_minute", &self.per_minute)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_quota() {
        let limiter = RateLimitService::new(3);
        assert!(limiter.check("code-a").is_ok());
        assert!(limiter.check("code-a").is_ok());
        assert!(limiter.check("code-a").is_ok());
        assert!(limiter.check("code-a").is_err());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimitService::new(1);
        assert!(limiter.check("code-a").is_ok());
        assert!(limiter.check("code-b").is_ok());
        assert!(limiter.check("code-a").is_err());
    }

    #[test]
    fn test_zero_quota_is_clamped() {
        let limiter = RateLimitService::new(0);
        assert!(limiter.check("x").is_ok());
    }
}
