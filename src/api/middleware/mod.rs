//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Rate limiter: per signed-in user, or anonymous
//! 2. Auth validator: bearer token lookup
//! 3. Audit logger: one line per request with user_id

pub mod audit;
pub mod auth;
pub mod rate;
