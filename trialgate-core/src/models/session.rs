use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::DemoConfig;

/// The authoritative in-memory record tracking one demo session's timing
/// state. One record per ephemeral user; lives only in the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoSession {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl DemoSession {
    pub fn new(user_id: Uuid, now: DateTime<Utc>, config: &DemoConfig) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            created_at: now,
            expires_at: now + Duration::minutes(config.duration_minutes),
            last_activity: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whole minutes left, rounded up, floored at 0.
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        let secs = (self.expires_at - now).num_seconds();
        if secs <= 0 {
            return 0;
        }
        (secs + 59) / 60
    }

    /// Record activity at `now`. Extends `expires_at` by the configured
    /// amount only when remaining time has dropped to the threshold or
    /// below — a bounded sliding renewal, not an unbounded keep-alive.
    /// Returns whether the expiry was extended.
    ///
    /// Callers must check `is_expired` first; touching an expired session
    /// would otherwise resurrect it.
    pub fn touch(&mut self, now: DateTime<Utc>, config: &DemoConfig) -> bool {
        self.last_activity = now;
        if self.remaining_minutes(now) <= config.extension_threshold_minutes {
            self.expires_at = self.expires_at + Duration::minutes(config.extension_minutes);
            return true;
        }
        false
    }
}
