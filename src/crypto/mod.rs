//! Password hashing and bearer tokens for the REST backend.

pub mod keys;
pub mod token;

pub use keys::*;
pub use token::*;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Stored password hash is malformed")]
    MalformedHash,

    #[error("Unsupported password hash scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}
