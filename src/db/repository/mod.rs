//! Repository layer: entity-scoped database operations.
//!
//! Dates and timestamps bind through rusqlite's chrono support, which
//! stores them as `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS.fff+00:00` text,
//! so range filters and ordering compare them lexically. Ids stay UUID
//! text.

mod adherence_log;
mod medicine;
mod user;

pub use adherence_log::*;
pub use medicine::*;
pub use user::*;
