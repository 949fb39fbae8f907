//! Connection admission trait.

/// Decides whether a source address may open another connection
#[cfg_attr(test, mockall::automock)]
pub trait ConnectionRateLimiter: Send + Sync {
    /// Record one attempt from `address` and report whether it is admitted
    fn is_allowed(&self, address: &str) -> bool;
}
