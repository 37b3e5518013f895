//! Local persistence.
//!
//! A minimal key-value store holding JSON values, and `MedicineBook`,
//! which keeps the whole medicine collection as one JSON array under a
//! single key. Writes are read-modify-write of the full array; the last
//! writer wins.

mod book;
mod file;
mod memory;

pub use book::MedicineBook;
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde_json::Value;
use thiserror::Error;

use crate::validation::FieldError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid store key: {0}")]
    InvalidKey(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Medicine not found: {0}")]
    NotFound(String),

    #[error("Invalid medicine: {} field error(s)", .0.len())]
    Invalid(Vec<FieldError>),
}

/// Get / set / clear JSON values by key.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: &Value) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}
