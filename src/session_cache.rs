//! In-memory login sessions and one-shot flash messages.
//!
//! The browser holds a random token in the `hms_session` cookie; the store
//! keeps only its SHA-256, so a dump of the store cannot be replayed.
//! Sessions idle past the timeout are discarded on next touch or prune.
//! A session may be anonymous: it then only carries flash messages across
//! a redirect, lives for `ANONYMOUS_TTL` at most, and at most
//! `MAX_ANONYMOUS_SESSIONS` of them exist; the oldest is evicted first.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "hms_session";

/// Lifetime of a flash-only session.
pub const ANONYMOUS_TTL: Duration = Duration::from_secs(300);
pub const MAX_ANONYMOUS_SESSIONS: usize = 1024;

/// Hash a session token using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random session token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

// ═══════════════════════════════════════════════════════════
// Flash messages
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Info => "info",
            FlashKind::Warning => "warning",
            FlashKind::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn new(kind: FlashKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Info, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashKind::Danger, message)
    }
}

// ═══════════════════════════════════════════════════════════
// SessionStore
// ═══════════════════════════════════════════════════════════

#[derive(Debug)]
struct SessionEntry {
    user_id: Option<Uuid>,
    last_seen: Instant,
    flashes: Vec<Flash>,
}

impl SessionEntry {
    fn new(user_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            last_seen: Instant::now(),
            flashes: Vec::new(),
        }
    }
}

/// Sessions keyed by token hash.
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<[u8; 32], SessionEntry>,
    idle_timeout: Duration,
    anonymous_ttl: Duration,
    max_anonymous: usize,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self::with_anonymous_limits(idle_timeout, ANONYMOUS_TTL, MAX_ANONYMOUS_SESSIONS)
    }

    pub fn with_anonymous_limits(
        idle_timeout: Duration,
        anonymous_ttl: Duration,
        max_anonymous: usize,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            idle_timeout,
            anonymous_ttl: anonymous_ttl.min(idle_timeout),
            max_anonymous,
        }
    }

    fn lifetime(&self, entry: &SessionEntry) -> Duration {
        if entry.user_id.is_some() {
            self.idle_timeout
        } else {
            self.anonymous_ttl
        }
    }

    fn is_expired(&self, entry: &SessionEntry) -> bool {
        entry.last_seen.elapsed() > self.lifetime(entry)
    }

    fn anonymous_count(&self) -> usize {
        self.sessions.values().filter(|e| e.user_id.is_none()).count()
    }

    /// Make room for one more anonymous session.
    fn evict_anonymous(&mut self) {
        if self.anonymous_count() < self.max_anonymous {
            return;
        }
        let oldest = self
            .sessions
            .iter()
            .filter(|(_, e)| e.user_id.is_none())
            .min_by_key(|(_, e)| e.last_seen)
            .map(|(key, _)| *key);
        if let Some(key) = oldest {
            self.sessions.remove(&key);
            tracing::debug!("Oldest anonymous session evicted");
        }
    }

    /// Live entry for a token, refreshing its idle clock. Expired entries are
    /// removed and reported as absent.
    fn touch(&mut self, token: &str) -> Option<&mut SessionEntry> {
        let key = hash_token(token);
        let expired = match self.sessions.get(&key) {
            Some(entry) => self.is_expired(entry),
            None => return None,
        };
        if expired {
            self.sessions.remove(&key);
            return None;
        }
        let entry = self.sessions.get_mut(&key)?;
        entry.last_seen = Instant::now();
        Some(entry)
    }

    /// Bind a fresh token to `user_id`.
    ///
    /// The previous token, if any, stops working; its pending flashes move to
    /// the new session.
    pub fn establish(&mut self, previous: Option<&str>, user_id: Uuid) -> String {
        let carried = previous
            .and_then(|token| self.sessions.remove(&hash_token(token)))
            .map(|entry| entry.flashes)
            .unwrap_or_default();

        let token = generate_token();
        let mut entry = SessionEntry::new(Some(user_id));
        entry.flashes = carried;
        self.sessions.insert(hash_token(&token), entry);
        token
    }

    /// The user a token is logged in as.
    pub fn current(&mut self, token: &str) -> Option<Uuid> {
        self.touch(token).and_then(|entry| entry.user_id)
    }

    pub fn destroy(&mut self, token: &str) {
        self.sessions.remove(&hash_token(token));
    }

    /// Log `user_id` out everywhere. Returns how many sessions ended.
    pub fn end_user_sessions(&mut self, user_id: &Uuid) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.user_id.as_ref() != Some(user_id));
        before - self.sessions.len()
    }

    /// Queue a flash on the token's session.
    ///
    /// Without a live session an anonymous one is created; its token is
    /// returned so the caller can set the cookie.
    pub fn push_flash(&mut self, token: Option<&str>, flash: Flash) -> Option<String> {
        if let Some(entry) = token.and_then(|t| self.touch(t)) {
            entry.flashes.push(flash);
            return None;
        }
        self.evict_anonymous();
        let token = generate_token();
        let mut entry = SessionEntry::new(None);
        entry.flashes.push(flash);
        self.sessions.insert(hash_token(&token), entry);
        Some(token)
    }

    /// Drain pending flashes; each is shown once.
    pub fn take_flashes(&mut self, token: &str) -> Vec<Flash> {
        self.touch(token)
            .map(|entry| std::mem::take(&mut entry.flashes))
            .unwrap_or_default()
    }

    /// Remove every idle session. Returns how many were dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.sessions.len();
        let (idle, anonymous) = (self.idle_timeout, self.anonymous_ttl);
        self.sessions.retain(|_, entry| {
            let lifetime = if entry.user_id.is_some() { idle } else { anonymous };
            entry.last_seen.elapsed() <= lifetime
        });
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
