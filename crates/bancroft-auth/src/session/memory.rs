//! In-memory session store.
//!
//! Backs the server in single-instance deployments and every test. Each
//! session tracks its last touch; entries past the idle timeout are
//! treated as absent and reaped lazily on access.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::SigninError;
use crate::session::{SessionId, SessionKey, SessionStore};

struct SessionEntry {
    values: HashMap<&'static str, serde_json::Value>,
    last_seen: OffsetDateTime,
}

/// Session store holding everything in process memory.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    idle_timeout: Duration,
}

impl MemorySessionStore {
    /// Creates a store with the given idle expiry.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn is_expired(&self, entry: &SessionEntry, now: OffsetDateTime) -> bool {
        let idle = time::Duration::try_from(self.idle_timeout).unwrap_or(time::Duration::MAX);
        now - entry.last_seen > idle
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(
        &self,
        session: SessionId,
        key: SessionKey,
    ) -> Result<Option<serde_json::Value>, SigninError> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.sessions.write().await;

        let Some(entry) = sessions.get_mut(&session) else {
            return Ok(None);
        };
        if self.is_expired(entry, now) {
            sessions.remove(&session);
            return Ok(None);
        }

        entry.last_seen = now;
        Ok(entry.values.get(key.as_str()).cloned())
    }

    async fn set(
        &self,
        session: SessionId,
        key: SessionKey,
        value: serde_json::Value,
    ) -> Result<(), SigninError> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.sessions.write().await;

        let entry = sessions.entry(session).or_insert_with(|| SessionEntry {
            values: HashMap::new(),
            last_seen: now,
        });
        if self.is_expired(entry, now) {
            entry.values.clear();
        }
        entry.last_seen = now;
        entry.values.insert(key.as_str(), value);
        Ok(())
    }

    async fn remove(
        &self,
        session: SessionId,
        key: SessionKey,
    ) -> Result<Option<serde_json::Value>, SigninError> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.sessions.write().await;

        let Some(entry) = sessions.get_mut(&session) else {
            return Ok(None);
        };
        if self.is_expired(entry, now) {
            sessions.remove(&session);
            return Ok(None);
        }

        entry.last_seen = now;
        Ok(entry.values.remove(key.as_str()))
    }

    async fn clear(&self, session: SessionId) -> Result<(), SigninError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&session);
        Ok(())
    }
}
