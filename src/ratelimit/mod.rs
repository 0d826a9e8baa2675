//! Login-failure rate limiting logic and state management.

mod attempts;
mod limiter;

pub use attempts::{AttemptRecord, AttemptStore};
pub use limiter::{client_key, LoginRateLimiter};
