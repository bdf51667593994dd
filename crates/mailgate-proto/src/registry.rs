//! Registry of live sessions.
//!
//! The only state shared between connections. Entries are added when a
//! connection is accepted and removed when its [`SessionGuard`] drops,
//! however the session ends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Bookkeeping record for one live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session id.
    pub id: Uuid,
    /// Peer address.
    pub peer: String,
    /// When the connection was accepted.
    pub connected_at: DateTime<Utc>,
}

/// Mutex-guarded set of live sessions. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<Uuid, SessionInfo>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a session. It stays registered until the guard drops.
    #[must_use = "the session is unregistered when the guard drops"]
    pub fn register(&self, id: Uuid, peer: impl Into<String>) -> SessionGuard {
        let info = SessionInfo {
            id,
            peer: peer.into(),
            connected_at: Utc::now(),
        };
        self.lock().insert(id, info);
        SessionGuard {
            id,
            registry: self.clone(),
        }
    }

    /// Returns the live sessions, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self.lock().values().cloned().collect();
        sessions.sort_by_key(|s| s.connected_at);
        sessions
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no session is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn remove(&self, id: Uuid) {
        self.lock().remove(&id);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, SessionInfo>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes its session from the registry on drop.
#[derive(Debug)]
pub struct SessionGuard {
    id: Uuid,
    registry: SessionRegistry,
}

impl SessionGuard {
    /// Returns the session id.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
