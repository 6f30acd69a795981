//! Ephemeral user store — the durable half of a demo session.
//!
//! `UserStore` is the seam the lifecycle controller depends on. Two
//! implementations:
//! - **Postgres** — real deployments; hard deletes, no soft-delete lingering.
//! - **In-memory** — local development and tests.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::user::DemoUser;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Allocate a fresh ephemeral account with random, unguessable
    /// credentials. The credentials are never returned to callers.
    async fn create_ephemeral_user(&self) -> anyhow::Result<DemoUser>;

    /// Hard delete. Deleting an already-absent user is not an error.
    async fn delete_user(&self, user_id: Uuid) -> anyhow::Result<()>;

    async fn find_user(&self, user_id: Uuid) -> anyhow::Result<Option<DemoUser>>;

    /// All demo-flagged user ids, for the startup reconciliation sweep.
    async fn list_demo_user_ids(&self) -> anyhow::Result<Vec<Uuid>>;
}

/// 122 bits of randomness, hex-encoded. Used for both usernames (suffix)
/// and throwaway passwords.
fn random_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn fresh_demo_user() -> DemoUser {
    let id = Uuid::new_v4();
    let suffix = &id.simple().to_string()[..12];
    DemoUser {
        id,
        username: format!("demo-{}", suffix),
        display_name: "Demo Workspace".to_string(),
        is_demo: true,
        created_at: Utc::now(),
    }
}

// ============================================================================
// Postgres implementation
// ============================================================================

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_ephemeral_user(&self) -> anyhow::Result<DemoUser> {
        let user = fresh_demo_user();
        sqlx::query(
            r#"
            INSERT INTO demo_users (id, username, display_name, password_hash, is_demo, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(random_token())
        .bind(user.is_demo)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM demo_users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> anyhow::Result<Option<DemoUser>> {
        let user = sqlx::query_as::<_, DemoUser>(
            r#"
            SELECT id, username, display_name, is_demo, created_at
            FROM demo_users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_demo_user_ids(&self) -> anyhow::Result<Vec<Uuid>> {
        let ids: Vec<(Uuid,)> =
            sqlx::query_as("SELECT id FROM demo_users WHERE is_demo = TRUE")
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

// ============================================================================
// In-memory implementation
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, DemoUser>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_ephemeral_user(&self) -> anyhow::Result<DemoUser> {
        let user = fresh_demo_user();
        self.users.lock().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, user_id: Uuid) -> anyhow::Result<()> {
        self.users.lock().await.remove(&user_id);
        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> anyhow::Result<Option<DemoUser>> {
        Ok(self.users.lock().await.get(&user_id).cloned())
    }

    async fn list_demo_user_ids(&self) -> anyhow::Result<Vec<Uuid>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .filter(|u| u.is_demo)
            .map(|u| u.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_create_find_delete() {
        let store = InMemoryUserStore::new();
        let user = store.create_ephemeral_user().await.unwrap();
        assert!(user.is_demo);
        assert!(user.username.starts_with("demo-"));

        let found = store.find_user(user.id).await.unwrap();
        assert_eq!(found.unwrap().id, user.id);

        store.delete_user(user.id).await.unwrap();
        assert!(store.find_user(user.id).await.unwrap().is_none());

        // Deleting again is a no-op.
        store.delete_user(user.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_created_users_are_unique() {
        let store = InMemoryUserStore::new();
        let a = store.create_ephemeral_user().await.unwrap();
        let b = store.create_ephemeral_user().await.unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.username, b.username);
    }
}
