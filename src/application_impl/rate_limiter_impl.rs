use crate::application_port::{RateLimitExceeded, RateLimiter, RateScope};
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub auth_max: usize,
    pub global_max: usize,
}

/// Per-client sliding windows of attempt timestamps. Dashmap's entry lock
/// serializes concurrent increments for one client, so bursts cannot
/// undercount.
pub struct SlidingWindowRateLimiter {
    cfg: RateLimitConfig,
    hits: DashMap<(RateScope, String), Vec<Instant>>,
}

impl SlidingWindowRateLimiter {
    pub fn new(cfg: RateLimitConfig) -> Self {
        SlidingWindowRateLimiter {
            cfg,
            hits: DashMap::new(),
        }
    }

    fn max_for(&self, scope: RateScope) -> usize {
        match scope {
            RateScope::Auth => self.cfg.auth_max,
            RateScope::Global => self.cfg.global_max,
        }
    }
}

impl RateLimiter for SlidingWindowRateLimiter {
    fn check(&self, scope: RateScope, client: &str) -> Result<(), RateLimitExceeded> {
        let max = self.max_for(scope);
        let now = Instant::now();

        let mut entry = self.hits.entry((scope, client.to_string())).or_default();
        entry.retain(|hit| now.duration_since(*hit) < self.cfg.window);
        if entry.len() >= max {
            return Err(RateLimitExceeded);
        }
        entry.push(now);

        Ok(())
    }

    fn prune(&self) {
        let now = Instant::now();
        self.hits.retain(|_, hits| {
            hits.retain(|hit| now.duration_since(*hit) < self.cfg.window);
            !hits.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(window: Duration) -> SlidingWindowRateLimiter {
        SlidingWindowRateLimiter::new(RateLimitConfig {
            window,
            auth_max: 5,
            global_max: 100,
        })
    }

    #[test]
    fn sixth_auth_attempt_is_rejected() {
        let limiter = limiter(Duration::from_secs(900));

        for _ in 0..5 {
            assert!(limiter.check(RateScope::Auth, "10.0.0.1").is_ok());
        }
        assert!(limiter.check(RateScope::Auth, "10.0.0.1").is_err());
    }

    #[test]
    fn clients_are_counted_independently() {
        let limiter = limiter(Duration::from_secs(900));

        for _ in 0..5 {
            assert!(limiter.check(RateScope::Auth, "10.0.0.1").is_ok());
        }
        assert!(limiter.check(RateScope::Auth, "10.0.0.1").is_err());
        assert!(limiter.check(RateScope::Auth, "10.0.0.2").is_ok());
    }

    #[test]
    fn scopes_are_counted_independently() {
        let limiter = limiter(Duration::from_secs(900));

        for _ in 0..5 {
            assert!(limiter.check(RateScope::Auth, "10.0.0.1").is_ok());
        }
        assert!(limiter.check(RateScope::Auth, "10.0.0.1").is_err());
        assert!(limiter.check(RateScope::Global, "10.0.0.1").is_ok());
    }

    #[test]
    fn window_slides() {
        let limiter = limiter(Duration::from_millis(50));

        for _ in 0..5 {
            assert!(limiter.check(RateScope::Auth, "10.0.0.1").is_ok());
        }
        assert!(limiter.check(RateScope::Auth, "10.0.0.1").is_err());

        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.check(RateScope::Auth, "10.0.0.1").is_ok());
    }

    #[test]
    fn prune_drops_idle_windows() {
        let limiter = limiter(Duration::from_millis(10));

        limiter.check(RateScope::Global, "10.0.0.1").unwrap();
        assert_eq!(limiter.hits.len(), 1);

        std::thread::sleep(Duration::from_millis(20));
        limiter.prune();
        assert_eq!(limiter.hits.len(), 0);
    }
}
