//! Shared state for the REST backend.
//!
//! `CoreState` is wrapped in `Arc` at startup and handed to the axum
//! router. Handlers open their own SQLite connection per request; the
//! only in-memory state is the bearer-token registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::crypto::{generate_token, hash_token};
use crate::db;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    db_path: PathBuf,
    /// PBKDF2 rounds for newly hashed passwords.
    pub pbkdf2_iterations: u32,
    sessions: RwLock<SessionRegistry>,
    clock: Arc<dyn Clock>,
}

impl CoreState {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &ServerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            db_path: config.db_path.clone(),
            pbkdf2_iterations: config.pbkdf2_iterations,
            sessions: RwLock::new(SessionRegistry::new(Duration::from_secs(
                config.token_ttl_secs,
            ))),
            clock,
        }
    }

    /// Open a database connection. Most common operation in handlers.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // ── Sessions ────────────────────────────────────────────

    /// Issue a bearer token for `user_id`. Only its hash is retained.
    pub fn issue_token(&self, user_id: Uuid, email: &str) -> Result<String, CoreError> {
        let mut sessions = self.sessions.write().map_err(|_| CoreError::LockPoisoned)?;
        Ok(sessions.issue(user_id, email))
    }

    /// Resolve a presented token to its session, if live.
    pub fn validate_token(&self, token: &str) -> Result<Option<Session>, CoreError> {
        let sessions = self.sessions.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(sessions.validate(token))
    }

    /// Revoke a token. Returns `false` if it was unknown.
    pub fn revoke_token(&self, token: &str) -> Result<bool, CoreError> {
        let mut sessions = self.sessions.write().map_err(|_| CoreError::LockPoisoned)?;
        Ok(sessions.revoke(token))
    }
}

// ═══════════════════════════════════════════════════════════
// Session registry: token hash → user, with expiry
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug)]
struct SessionEntry {
    session: Session,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct SessionRegistry {
    entries: HashMap<[u8; 32], SessionEntry>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn issue(&mut self, user_id: Uuid, email: &str) -> String {
        self.purge_expired();
        let token = generate_token();
        self.entries.insert(
            hash_token(&token),
            SessionEntry {
                session: Session {
                    user_id,
                    email: email.to_string(),
                },
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    pub fn validate(&self, token: &str) -> Option<Session> {
        let entry = self.entries.get(&hash_token(token))?;
        if Instant::now() >= entry.expires_at {
            return None;
        }
        Some(entry.session.clone())
    }

    pub fn revoke(&mut self, token: &str) -> bool {
        self.entries.remove(&hash_token(token)).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, e| now < e.expires_at);
    }
}

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}
