//! Bearer-token auth sessions — the broader login session, distinct from
//! the demo session record. The demo-guard middleware revokes these when a
//! demo session turns out to be dead, forcing re-onboarding instead of
//! letting a stale token keep hitting the API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// The authenticated identity attached to a request. `is_demo` is carried
/// explicitly; nothing in the request path infers it from the username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub user_id: Uuid,
    pub username: String,
    pub is_demo: bool,
}

#[async_trait]
pub trait AuthSessions: Send + Sync {
    async fn insert(&self, token: String, identity: AuthIdentity);

    async fn get(&self, token: &str) -> Option<AuthIdentity>;

    /// Returns whether the token existed.
    async fn revoke(&self, token: &str) -> bool;

    /// Drop every token for a user. Returns how many were revoked.
    async fn revoke_user(&self, user_id: Uuid) -> usize;
}

pub fn issue_token() -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

#[derive(Default)]
pub struct InMemoryAuthSessions {
    tokens: Mutex<HashMap<String, AuthIdentity>>,
}

impl InMemoryAuthSessions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthSessions for InMemoryAuthSessions {
    async fn insert(&self, token: String, identity: AuthIdentity) {
        self.tokens.lock().await.insert(token, identity);
    }

    async fn get(&self, token: &str) -> Option<AuthIdentity> {
        self.tokens.lock().await.get(token).cloned()
    }

    async fn revoke(&self, token: &str) -> bool {
        self.tokens.lock().await.remove(token).is_some()
    }

    async fn revoke_user(&self, user_id: Uuid) -> usize {
        let mut tokens = self.tokens.lock().await;
        let before = tokens.len();
        tokens.retain(|_, identity| identity.user_id != user_id);
        before - tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(user_id: Uuid, is_demo: bool) -> AuthIdentity {
        AuthIdentity {
            user_id,
            username: "demo-abc123".to_string(),
            is_demo,
        }
    }

    #[tokio::test]
    async fn test_insert_get_revoke() {
        let sessions = InMemoryAuthSessions::new();
        let user_id = Uuid::new_v4();
        let token = issue_token();
        sessions.insert(token.clone(), identity(user_id, true)).await;

        let found = sessions.get(&token).await.unwrap();
        assert_eq!(found.user_id, user_id);
        assert!(found.is_demo);

        assert!(sessions.revoke(&token).await);
        assert!(sessions.get(&token).await.is_none());
        assert!(!sessions.revoke(&token).await);
    }

    #[tokio::test]
    async fn test_revoke_user_drops_all_their_tokens() {
        let sessions = InMemoryAuthSessions::new();
        let target = Uuid::new_v4();
        let other = Uuid::new_v4();

        let t1 = issue_token();
        let t2 = issue_token();
        let t3 = issue_token();
        sessions.insert(t1.clone(), identity(target, true)).await;
        sessions.insert(t2.clone(), identity(target, true)).await;
        sessions.insert(t3.clone(), identity(other, false)).await;

        assert_eq!(sessions.revoke_user(target).await, 2);
        assert!(sessions.get(&t1).await.is_none());
        assert!(sessions.get(&t2).await.is_none());
        assert!(sessions.get(&t3).await.is_some());
    }

    #[test]
    fn test_issued_tokens_are_unique() {
        assert_ne!(issue_token(), issue_token());
        assert_eq!(issue_token().len(), 64);
    }
}
