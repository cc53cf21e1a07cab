use std::time::{Duration, Instant};

use {dashmap::DashMap, tracing::debug};

use crate::Session;

struct Entry {
    session: Session,
    touched_at: Instant,
}

/// Concurrent session table keyed by user id.
///
/// Each user maps to its own shard entry, so users never contend with each
/// other. With a TTL configured, sessions idle for longer than the TTL are
/// treated as absent and removed on access or by [`evict_expired`].
///
/// [`evict_expired`]: SessionStore::evict_expired
pub struct SessionStore {
    sessions: DashMap<String, Entry>,
    ttl: Option<Duration>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Idle TTL, if sessions expire at all.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(entry.touched_at) >= ttl)
    }

    /// Current session for `user_id`, if any and not idle past the TTL.
    pub fn get(&self, user_id: &str) -> Option<Session> {
        let now = Instant::now();
        if self
            .sessions
            .remove_if(user_id, |_, entry| self.is_expired(entry, now))
            .is_some()
        {
            debug!(user_id, "session expired");
            return None;
        }
        self.sessions.get(user_id).map(|e| e.session.clone())
    }

    /// Insert or replace the session keyed by its `user_id`, refreshing its
    /// idle timer.
    pub fn put(&self, session: Session) {
        self.sessions.insert(session.user_id.clone(), Entry {
            session,
            touched_at: Instant::now(),
        });
    }

    /// Remove the session for `user_id`. Returns whether one existed.
    pub fn delete(&self, user_id: &str) -> bool {
        self.sessions.remove(user_id).is_some()
    }

    /// Drop every session idle past the TTL. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !self.is_expired(entry, now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::sync::Arc};

    fn age(store: &SessionStore, user_id: &str, by: Duration) {
        let mut entry = store.sessions.get_mut(user_id).unwrap();
        entry.touched_at = Instant::now() - by;
    }

    #[test]
    fn put_get_delete() {
        let store = SessionStore::default();
        store.put(Session::new("/echo", "u1"));

        let s = store.get("u1").unwrap();
        assert_eq!(s.command, "/echo");
        assert!(store.get("u2").is_none());

        assert!(store.delete("u1"));
        assert!(!store.delete("u1"));
        assert!(store.get("u1").is_none());
    }

    #[test]
    fn put_replaces_existing_session() {
        let store = SessionStore::default();
        store.put(Session::new("/echo", "u1"));
        let mut next = Session::new("/echo", "u1");
        next.advance();
        store.put(next);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("u1").unwrap().current_step, 1);
    }

    #[test]
    fn idle_session_expires_on_get() {
        let store = SessionStore::new(Some(Duration::from_secs(60)));
        store.put(Session::new("/price", "u1"));
        age(&store, "u1", Duration::from_secs(61));

        assert!(store.get("u1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn put_refreshes_idle_timer() {
        let store = SessionStore::new(Some(Duration::from_secs(60)));
        store.put(Session::new("/price", "u1"));
        age(&store, "u1", Duration::from_secs(59));
        store.put(Session::new("/price", "u1"));
        age(&store, "u1", Duration::from_secs(30));

        assert!(store.get("u1").is_some());
    }

    #[test]
    fn without_ttl_sessions_never_expire() {
        let store = SessionStore::new(None);
        store.put(Session::new("/swap", "u1"));
        age(&store, "u1", Duration::from_secs(86_400));

        assert_eq!(store.evict_expired(), 0);
        assert!(store.get("u1").is_some());
    }

    #[test]
    fn evict_expired_only_drops_idle_sessions() {
        let store = SessionStore::new(Some(Duration::from_secs(60)));
        store.put(Session::new("/price", "idle"));
        store.put(Session::new("/price", "fresh"));
        age(&store, "idle", Duration::from_secs(120));

        assert_eq!(store.evict_expired(), 1);
        assert!(store.get("idle").is_none());
        assert!(store.get("fresh").is_some());
    }

    #[tokio::test]
    async fn concurrent_users_do_not_interfere() {
        let store = Arc::new(SessionStore::default());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let user = format!("user-{i}");
                let mut session = Session::new("/echo", user.as_str());
                store.put(session.clone());
                session.advance();
                store.put(session);
                store.get(&user).map(|s| s.current_step)
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Some(1));
        }
        assert_eq!(store.len(), 32);
    }
}
