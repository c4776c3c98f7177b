//! Application state shared by every request handler.
//!
//! There is no long-lived connection: each action opens its own
//! `rusqlite::Connection` from the configured path and drops it when done.
//! The only in-process mutable state is the session store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::db;
use crate::session_cache::SessionStore;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    db_path: PathBuf,
    sessions: Mutex<SessionStore>,
}

impl CoreState {
    /// Create the state and make sure the schema exists.
    pub fn new(db_path: PathBuf, session_idle_timeout: Duration) -> Result<Self, CoreError> {
        db::open_database(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database ready");
        Ok(Self {
            db_path,
            sessions: Mutex::new(SessionStore::new(session_idle_timeout)),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a fresh connection for one action.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn sessions(&self) -> Result<MutexGuard<'_, SessionStore>, CoreError> {
        self.sessions.lock().map_err(|_| CoreError::LockPoisoned)
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}
