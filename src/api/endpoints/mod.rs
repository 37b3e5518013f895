//! API endpoint handlers.
//!
//! Handlers reuse the core modules (`medicines`, `validation`,
//! `adherence`) and the `db` repositories.

pub mod adherence;
pub mod auth;
pub mod health;
pub mod medicines;
