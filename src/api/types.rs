//! Shared types for the web layer.

use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::WebError;
use crate::authorization::Principal;
use crate::core_state::CoreState;
use crate::models::User;
use crate::session_cache::Flash;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    /// Run a database action on the blocking pool with its own connection.
    pub async fn with_db<T, F>(&self, action: F) -> Result<T, WebError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, WebError> + Send + 'static,
    {
        let core = self.core.clone();
        tokio::task::spawn_blocking(move || {
            let conn = core.open_db()?;
            action(&conn)
        })
        .await
        .map_err(|e| WebError::Internal(format!("blocking task failed: {e}")))?
    }
}

// ═══════════════════════════════════════════════════════════
// Request extensions
// ═══════════════════════════════════════════════════════════

/// Session state resolved from the cookie, injected by the session
/// middleware into every request.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub token: Option<String>,
    pub user: Option<User>,
}

/// The logged-in identity, injected by `require_login`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn principal(&self) -> Principal {
        Principal::from(&self.0)
    }
}

// ═══════════════════════════════════════════════════════════
// Response extensions: consumed by the session middleware
// ═══════════════════════════════════════════════════════════

/// A handler replaced or ended the caller's session.
#[derive(Debug, Clone)]
pub enum SessionChange {
    Established(String),
    Ended,
}

/// A message to show on the next rendered page.
#[derive(Debug, Clone)]
pub struct PendingFlash(pub Flash);

// ═══════════════════════════════════════════════════════════
// Response helpers
// ═══════════════════════════════════════════════════════════

/// 303 See Other to `location`, optionally carrying a flash.
pub fn redirect(location: &str, flash: Option<Flash>) -> axum::response::Response {
    use axum::response::{IntoResponse, Redirect};

    let mut response = Redirect::to(location).into_response();
    if let Some(flash) = flash {
        response.extensions_mut().insert(PendingFlash(flash));
    }
    response
}
