//! Frequency Resolver.
//!
//! Turns the free-text frequency label of a medicine into a daily dose
//! count, expands selected reminder times into per-dose schedule
//! entries, formats them for display, and derives an end date from a
//! free-text duration. Everything here is pure: callers pass "today"
//! explicitly.

mod duration;
mod expand;
mod flow;
mod frequency;

pub use duration::*;
pub use expand::*;
pub use flow::*;
pub use frequency::*;
