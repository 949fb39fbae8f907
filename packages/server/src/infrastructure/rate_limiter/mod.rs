//! Connection rate limiter implementations.

pub mod sliding_window;

pub use sliding_window::SlidingWindowRateLimiter;
