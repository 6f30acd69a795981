//! Session store — process-wide map of live demo sessions.
//!
//! Primary index: `session_id -> DemoSession`. Secondary index:
//! `user_id -> session_id`, which enforces the one-session-per-user
//! invariant. The store is deliberately a small trait so the in-memory
//! implementation can be swapped for an external keyed store if the
//! service ever scales horizontally; today's implementation does not
//! survive a restart and is not shared across instances.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::session::DemoSession;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace. Any previous session for the same user is
    /// dropped so the user index never points at a stale record.
    async fn put(&self, session: DemoSession);

    async fn get(&self, session_id: Uuid) -> Option<DemoSession>;

    async fn get_by_user(&self, user_id: Uuid) -> Option<DemoSession>;

    /// Replace the stored record only while the same `session_id` is still
    /// present. Returns `false` when the session is gone, so a read-modify-
    /// write caller racing a teardown cannot re-insert a destroyed session.
    async fn update_if_present(&self, session: DemoSession) -> bool;

    /// Remove both index entries for a user in one step. Returns the
    /// removed record, or `None` if the user had no session.
    async fn remove_by_user(&self, user_id: Uuid) -> Option<DemoSession>;

    async fn list_all(&self) -> Vec<DemoSession>;
}

#[derive(Default)]
struct StoreInner {
    by_session: HashMap<Uuid, DemoSession>,
    by_user: HashMap<Uuid, Uuid>,
}

/// Single-process store. Both indices live under one mutex, so every
/// operation observes them consistently — a lookup racing a teardown sees
/// either the full record or nothing, never a dangling index entry.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: Mutex<StoreInner>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, session: DemoSession) {
        let mut inner = self.inner.lock().await;
        if let Some(old_sid) = inner.by_user.insert(session.user_id, session.session_id) {
            if old_sid != session.session_id {
                inner.by_session.remove(&old_sid);
            }
        }
        inner.by_session.insert(session.session_id, session);
    }

    async fn get(&self, session_id: Uuid) -> Option<DemoSession> {
        self.inner.lock().await.by_session.get(&session_id).cloned()
    }

    async fn get_by_user(&self, user_id: Uuid) -> Option<DemoSession> {
        let inner = self.inner.lock().await;
        let sid = inner.by_user.get(&user_id)?;
        inner.by_session.get(sid).cloned()
    }

    async fn update_if_present(&self, session: DemoSession) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.by_session.contains_key(&session.session_id) {
            return false;
        }
        inner.by_session.insert(session.session_id, session);
        true
    }

    async fn remove_by_user(&self, user_id: Uuid) -> Option<DemoSession> {
        let mut inner = self.inner.lock().await;
        let sid = inner.by_user.remove(&user_id)?;
        inner.by_session.remove(&sid)
    }

    async fn list_all(&self) -> Vec<DemoSession> {
        self.inner.lock().await.by_session.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;
    use chrono::Utc;

    fn session_for(user_id: Uuid) -> DemoSession {
        DemoSession::new(user_id, Utc::now(), &DemoConfig::default())
    }

    #[tokio::test]
    async fn test_put_get_both_indices() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();
        let session = session_for(user_id);
        let sid = session.session_id;
        store.put(session).await;

        assert!(store.get(sid).await.is_some());
        assert_eq!(store.get_by_user(user_id).await.unwrap().session_id, sid);
        assert_eq!(store.list_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_one_session_per_user() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();
        let first = session_for(user_id);
        let first_sid = first.session_id;
        store.put(first).await;

        let second = session_for(user_id);
        let second_sid = second.session_id;
        store.put(second).await;

        // The replaced session is gone from the primary index too.
        assert!(store.get(first_sid).await.is_none());
        assert_eq!(
            store.get_by_user(user_id).await.unwrap().session_id,
            second_sid
        );
        assert_eq!(store.list_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_clears_both_indices() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();
        let session = session_for(user_id);
        let sid = session.session_id;
        store.put(session).await;

        let removed = store.remove_by_user(user_id).await;
        assert_eq!(removed.unwrap().session_id, sid);
        assert!(store.get(sid).await.is_none());
        assert!(store.get_by_user(user_id).await.is_none());

        // Second removal is a no-op, not an error.
        assert!(store.remove_by_user(user_id).await.is_none());
    }

    #[tokio::test]
    async fn test_update_if_present_skips_removed_session() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();
        let session = session_for(user_id);
        store.put(session.clone()).await;

        let mut updated = session.clone();
        updated.last_activity = updated.last_activity + chrono::Duration::minutes(1);
        assert!(store.update_if_present(updated.clone()).await);
        assert_eq!(
            store.get(session.session_id).await.unwrap().last_activity,
            updated.last_activity
        );

        // Once torn down, a stale write-back is refused and nothing
        // reappears in either index.
        store.remove_by_user(user_id).await;
        assert!(!store.update_if_present(updated).await);
        assert!(store.get(session.session_id).await.is_none());
        assert!(store.get_by_user(user_id).await.is_none());
        assert!(store.list_all().await.is_empty());
    }
}
