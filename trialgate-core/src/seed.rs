//! Demo data seeding and teardown.
//!
//! Every session gets an isolated slice of sample data (clients, tasks,
//! invoices) keyed by the ephemeral user's id. `clear` is idempotent:
//! clearing twice, or clearing a user that was never seeded, succeeds.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[async_trait]
pub trait DemoSeeder: Send + Sync {
    async fn seed(&self, user_id: Uuid, session_id: Uuid) -> anyhow::Result<()>;

    /// Remove everything seeded for this user. Idempotent.
    async fn clear(&self, user_id: Uuid) -> anyhow::Result<()>;
}

const SAMPLE_CLIENTS: &[(&str, &str)] = &[
    ("Acme Design Co", "billing@acmedesign.example"),
    ("Northwind Consulting", "accounts@northwind.example"),
    ("Bluebird Media", "finance@bluebird.example"),
];

const SAMPLE_TASKS: &[(&str, &str)] = &[
    ("Draft homepage redesign proposal", "open"),
    ("Send Q3 retainer invoice", "open"),
    ("Follow up on signed contract", "in_progress"),
    ("Log hours for onboarding call", "done"),
];

const SAMPLE_INVOICES: &[(&str, i64, &str)] = &[
    ("INV-1001", 250_000, "paid"),
    ("INV-1002", 175_000, "sent"),
    ("INV-1003", 98_500, "draft"),
];

// ============================================================================
// Postgres implementation
// ============================================================================

pub struct PgDemoSeeder {
    pool: PgPool,
}

impl PgDemoSeeder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DemoSeeder for PgDemoSeeder {
    async fn seed(&self, user_id: Uuid, session_id: Uuid) -> anyhow::Result<()> {
        let mut client_ids = Vec::with_capacity(SAMPLE_CLIENTS.len());
        for (name, email) in SAMPLE_CLIENTS {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO demo_clients (id, owner_id, name, email, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id)
            .bind(user_id)
            .bind(name)
            .bind(email)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
            client_ids.push(id);
        }

        for (i, (title, status)) in SAMPLE_TASKS.iter().enumerate() {
            sqlx::query(
                "INSERT INTO demo_tasks (id, owner_id, client_id, title, status, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(client_ids[i % client_ids.len()])
            .bind(title)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        }

        for (i, (number, amount_cents, status)) in SAMPLE_INVOICES.iter().enumerate() {
            sqlx::query(
                "INSERT INTO demo_invoices (id, owner_id, client_id, number, amount_cents, status, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(client_ids[i % client_ids.len()])
            .bind(number)
            .bind(amount_cents)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        }

        tracing::debug!(
            user_id = %user_id,
            session_id = %session_id,
            "Seeded demo data"
        );
        Ok(())
    }

    async fn clear(&self, user_id: Uuid) -> anyhow::Result<()> {
        for table in ["demo_invoices", "demo_tasks", "demo_clients"] {
            sqlx::query(&format!("DELETE FROM {} WHERE owner_id = $1", table))
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

// ============================================================================
// In-memory implementation
// ============================================================================

/// Tracks seeded row counts per user. Enough for development mode and for
/// asserting isolation in tests.
#[derive(Default)]
pub struct InMemoryDemoSeeder {
    seeded: Mutex<HashMap<Uuid, usize>>,
}

impl InMemoryDemoSeeder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seeded_rows(&self, user_id: Uuid) -> usize {
        self.seeded.lock().await.get(&user_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl DemoSeeder for InMemoryDemoSeeder {
    async fn seed(&self, user_id: Uuid, _session_id: Uuid) -> anyhow::Result<()> {
        let rows = SAMPLE_CLIENTS.len() + SAMPLE_TASKS.len() + SAMPLE_INVOICES.len();
        self.seeded.lock().await.insert(user_id, rows);
        Ok(())
    }

    async fn clear(&self, user_id: Uuid) -> anyhow::Result<()> {
        self.seeded.lock().await.remove(&user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_seed_and_clear() {
        let seeder = InMemoryDemoSeeder::new();
        let user = Uuid::new_v4();
        seeder.seed(user, Uuid::new_v4()).await.unwrap();
        assert_eq!(seeder.seeded_rows(user).await, 10);

        seeder.clear(user).await.unwrap();
        assert_eq!(seeder.seeded_rows(user).await, 0);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let seeder = InMemoryDemoSeeder::new();
        let user = Uuid::new_v4();
        // Never seeded: clear must still succeed, twice.
        seeder.clear(user).await.unwrap();
        seeder.clear(user).await.unwrap();
    }
}
