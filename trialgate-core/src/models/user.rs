use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A temporary account created solely to back a demo session, deleted when
/// the session ends. `is_demo` is the authoritative flag — demo-ness is
/// never inferred from the username.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DemoUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub is_demo: bool,
    pub created_at: DateTime<Utc>,
}
