#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum RateScope {
    /// login / register; the tight window.
    Auth,
    /// Every endpoint combined.
    Global,
}

#[derive(Debug, thiserror::Error)]
#[error("too many requests")]
pub struct RateLimitExceeded;

/// Sliding-window counters per client. Counters must be safe to increment
/// from concurrent requests; undercounting under bursts is not acceptable.
pub trait RateLimiter: Send + Sync {
    /// Records the attempt and rejects once the window is full.
    fn check(&self, scope: RateScope, client: &str) -> Result<(), RateLimitExceeded>;

    /// Drop windows with no recent activity.
    fn prune(&self);
}
