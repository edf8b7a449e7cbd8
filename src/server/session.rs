//! Session bookkeeping for the HTTP transports
//!
//! Streamable HTTP sessions are created by `initialize` and only need to be
//! remembered. A client that vanishes without `DELETE /mcp` leaves its entry
//! behind, so those sessions expire after a period without requests. Legacy
//! SSE sessions also own the sender half of the channel feeding their event
//! stream and live exactly as long as that stream.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Idle time after which a streamable HTTP session is forgotten
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// One live session
#[derive(Debug)]
struct Session {
    last_seen: Instant,
    sse: Option<mpsc::UnboundedSender<Value>>,
}

impl Session {
    fn new(sse: Option<mpsc::UnboundedSender<Value>>) -> Self {
        Self {
            last_seen: Instant::now(),
            sse,
        }
    }
}

/// Shared map of live sessions
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    /// Empty store with [`DEFAULT_IDLE_TIMEOUT`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store expiring streamable HTTP sessions after `idle_timeout`
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // A panic while holding the lock leaves the map itself intact.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a streamable HTTP session and return its id
    ///
    /// Idle sessions are swept first.
    pub fn create(&self) -> String {
        self.prune_idle();
        let id = Uuid::new_v4().simple().to_string();
        self.lock().insert(id.clone(), Session::new(None));
        tracing::debug!(session = %id, "Session created");
        id
    }

    /// Start an SSE session; messages sent on it reach the returned receiver
    pub fn create_sse(&self) -> (String, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4().simple().to_string();
        self.lock().insert(id.clone(), Session::new(Some(tx)));
        tracing::debug!(session = %id, "SSE session opened");
        (id, rx)
    }

    /// Whether `id` names a live session
    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// Record activity on `id`; false if the session is unknown or expired
    pub fn touch(&self, id: &str) -> bool {
        let mut sessions = self.lock();
        match sessions.get_mut(id) {
            Some(session) if session.sse.is_some() => {
                session.last_seen = Instant::now();
                true
            }
            Some(session) if session.last_seen.elapsed() <= self.idle_timeout => {
                session.last_seen = Instant::now();
                true
            }
            Some(_) => {
                sessions.remove(id);
                tracing::debug!(session = %id, "Session expired");
                false
            }
            None => false,
        }
    }

    /// Forget streamable HTTP sessions idle longer than the timeout
    ///
    /// SSE sessions are left alone; their stream owns them. Returns how many
    /// sessions were removed.
    pub fn prune_idle(&self) -> usize {
        let timeout = self.idle_timeout;
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.sse.is_some() || s.last_seen.elapsed() <= timeout);
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, "Expired idle sessions");
        }
        removed
    }

    /// Event channel of an SSE session
    pub fn sse_sender(&self, id: &str) -> Option<mpsc::UnboundedSender<Value>> {
        self.lock().get(id).and_then(|s| s.sse.clone())
    }

    /// End a session; false if it did not exist
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            tracing::debug!(session = %id, "Session closed");
        }
        removed
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no session is live
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Removes an SSE session when its event stream is dropped
#[derive(Debug)]
pub struct SessionGuard {
    store: SessionStore,
    id: String,
}

impl SessionGuard {
    /// Guard `id` in `store`
    pub fn new(store: SessionStore, id: String) -> Self {
        Self { store, id }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.store.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_remove() {
        let store = SessionStore::new();
        let id = store.create();
        assert!(store.contains(&id));
        assert!(store.sse_sender(&id).is_none());
        assert!(store.touch(&id));
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_sse_sender_reaches_receiver() {
        let store = SessionStore::new();
        let (id, mut rx) = store.create_sse();
        store
            .sse_sender(&id)
            .unwrap()
            .send(serde_json::json!({"ok": true}))
            .unwrap();
        assert_eq!(rx.recv().await.unwrap()["ok"], true);
    }

    #[test]
    fn test_idle_session_expires() {
        let store = SessionStore::with_idle_timeout(Duration::from_millis(20));
        let stale = store.create();
        std::thread::sleep(Duration::from_millis(50));

        assert!(!store.touch(&stale));
        assert!(!store.contains(&stale));
    }

    #[test]
    fn test_create_sweeps_abandoned_sessions() {
        let store = SessionStore::with_idle_timeout(Duration::from_millis(20));
        let abandoned = store.create();
        let (sse, _rx) = store.create_sse();
        std::thread::sleep(Duration::from_millis(50));

        let fresh = store.create();
        assert!(!store.contains(&abandoned));
        assert!(store.contains(&sse));
        assert!(store.contains(&fresh));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_touch_keeps_active_session_alive() {
        let store = SessionStore::with_idle_timeout(Duration::from_millis(500));
        let id = store.create();
        for _ in 0..4 {
            std::thread::sleep(Duration::from_millis(200));
            assert!(store.touch(&id));
        }
        assert_eq!(store.prune_idle(), 0);
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let store = SessionStore::new();
        let (id, _rx) = store.create_sse();
        {
            let _guard = SessionGuard::new(store.clone(), id.clone());
        }
        assert!(!store.contains(&id));
    }
}
