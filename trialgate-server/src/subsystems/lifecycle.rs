//! Demo session lifecycle controller.
//!
//! Sole authority for creating, validating, extending, and destroying demo
//! sessions. Every other component (HTTP handlers, middleware, sweeper,
//! admin IPC) goes through this type; nothing else mutates the session
//! store or the ephemeral user records.
//!
//! Teardown order: the store entries go first, then seeded data, then the
//! user row. A lookup racing a teardown therefore sees "no session"
//! immediately instead of a record pointing at half-deleted backing data.
//! Sessions never come back once torn down.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use trialgate_core::config::DemoConfig;
use trialgate_core::error::SessionError;
use trialgate_core::models::session::DemoSession;
use trialgate_core::models::user::DemoUser;
use trialgate_core::seed::DemoSeeder;
use trialgate_core::store::SessionStore;
use trialgate_core::users::UserStore;

/// Result of a status lookup.
#[derive(Debug, Clone)]
pub enum SessionStatus {
    /// The user has no demo session. Normal for regular accounts.
    NotDemo,
    /// The session had expired; it has been torn down as part of this call.
    Expired,
    Active {
        session: DemoSession,
        remaining_minutes: i64,
    },
}

/// Result of recording activity.
#[derive(Debug, Clone)]
pub enum TouchOutcome {
    /// No session for this user; nothing happened.
    NoSession,
    Touched {
        extended: bool,
        session: DemoSession,
    },
}

pub struct DemoLifecycle {
    store: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    seeder: Arc<dyn DemoSeeder>,
    config: DemoConfig,
}

impl DemoLifecycle {
    pub fn new(
        store: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        seeder: Arc<dyn DemoSeeder>,
        config: DemoConfig,
    ) -> Self {
        Self {
            store,
            users,
            seeder,
            config,
        }
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub async fn sessions(&self) -> Vec<DemoSession> {
        self.store.list_all().await
    }

    // ========================================================================
    // Create
    // ========================================================================

    pub async fn create_session(&self) -> Result<(DemoSession, DemoUser), SessionError> {
        self.create_session_at(Utc::now()).await
    }

    /// Allocate an ephemeral user, seed its isolated demo data, and insert
    /// the session record. On seed failure the user is rolled back before
    /// the error is returned; no partial state survives.
    pub async fn create_session_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(DemoSession, DemoUser), SessionError> {
        let user = self
            .users
            .create_ephemeral_user()
            .await
            .map_err(|source| SessionError::Creation { source })?;

        let session = DemoSession::new(user.id, now, &self.config);

        if let Err(seed_err) = self.seeder.seed(user.id, session.session_id).await {
            tracing::error!(
                user_id = %user.id,
                session_id = %session.session_id,
                error = %seed_err,
                "Demo data seeding failed; rolling back ephemeral user"
            );
            if let Err(del_err) = self.users.delete_user(user.id).await {
                tracing::error!(
                    user_id = %user.id,
                    error = %del_err,
                    "Rollback of ephemeral user failed; user may be orphaned"
                );
            }
            return Err(SessionError::Creation { source: seed_err });
        }

        self.store.put(session.clone()).await;
        tracing::info!(
            user_id = %user.id,
            session_id = %session.session_id,
            expires_at = %session.expires_at,
            "Demo session created"
        );
        Ok((session, user))
    }

    // ========================================================================
    // Status
    // ========================================================================

    pub async fn get_status(&self, user_id: Uuid) -> SessionStatus {
        self.get_status_at(user_id, Utc::now()).await
    }

    /// Lazy expiry: a status check on a session that has passed its
    /// `expires_at` tears it down synchronously and reports `Expired`.
    /// Teardown failures here are logged, not surfaced — from the status
    /// path's perspective the session is gone either way.
    pub async fn get_status_at(&self, user_id: Uuid, now: DateTime<Utc>) -> SessionStatus {
        let session = match self.store.get_by_user(user_id).await {
            Some(s) => s,
            None => return SessionStatus::NotDemo,
        };

        if session.is_expired(now) {
            if let Err(e) = self.teardown(user_id).await {
                tracing::warn!(
                    user_id = %user_id,
                    session_id = %session.session_id,
                    error = %e,
                    "Teardown during lazy expiry failed"
                );
            }
            return SessionStatus::Expired;
        }

        let remaining_minutes = session.remaining_minutes(now);
        SessionStatus::Active {
            session,
            remaining_minutes,
        }
    }

    // ========================================================================
    // Activity
    // ========================================================================

    pub async fn touch_activity(&self, user_id: Uuid) -> Result<TouchOutcome, SessionError> {
        self.touch_activity_at(user_id, Utc::now()).await
    }

    pub async fn touch_activity_at(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TouchOutcome, SessionError> {
        let mut session = match self.store.get_by_user(user_id).await {
            Some(s) => s,
            None => return Ok(TouchOutcome::NoSession),
        };

        if session.is_expired(now) {
            if let Err(e) = self.teardown(user_id).await {
                tracing::warn!(
                    user_id = %user_id,
                    session_id = %session.session_id,
                    error = %e,
                    "Teardown of expired session on activity failed"
                );
            }
            return Err(SessionError::Expired);
        }

        let extended = session.touch(now, &self.config);
        if !self.store.update_if_present(session.clone()).await {
            // A teardown won the race between our read and this write-back.
            // Destroyed is terminal; do not re-insert the record.
            return Ok(TouchOutcome::NoSession);
        }
        if extended {
            tracing::debug!(
                user_id = %user_id,
                session_id = %session.session_id,
                expires_at = %session.expires_at,
                "Demo session extended on activity"
            );
        }
        Ok(TouchOutcome::Touched { extended, session })
    }

    // ========================================================================
    // End / teardown
    // ========================================================================

    pub async fn end_session(&self, user_id: Uuid) -> Result<bool, SessionError> {
        if self.store.get_by_user(user_id).await.is_none() {
            return self.finish_orphaned_teardown(user_id).await;
        }
        self.teardown(user_id)
            .await
            .map_err(|source| SessionError::Teardown { user_id, source })?;
        tracing::info!(user_id = %user_id, "Demo session ended");
        Ok(true)
    }

    /// Teardown removes the store entries before the backing rows, so a
    /// clear/delete failure can leave a demo user with no session record.
    /// A retried end finds that leftover and finishes the job instead of
    /// reporting "nothing to end".
    async fn finish_orphaned_teardown(&self, user_id: Uuid) -> Result<bool, SessionError> {
        let leftover = self
            .users
            .find_user(user_id)
            .await
            .map_err(|source| SessionError::Teardown { user_id, source })?;
        match leftover {
            Some(user) if user.is_demo => {
                self.seeder
                    .clear(user_id)
                    .await
                    .map_err(|source| SessionError::Teardown { user_id, source })?;
                self.users
                    .delete_user(user_id)
                    .await
                    .map_err(|source| SessionError::Teardown { user_id, source })?;
                tracing::info!(
                    user_id = %user_id,
                    "Finished teardown left incomplete by an earlier failure"
                );
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Shared teardown path for manual end, lazy expiry, and the sweeper.
    /// Removes the store entries first, then clears seeded data, then
    /// deletes the user. Collaborators are idempotent, so a half-failed
    /// teardown can be retried by the sweeper without double-delete issues.
    pub(crate) async fn teardown(&self, user_id: Uuid) -> anyhow::Result<()> {
        self.store.remove_by_user(user_id).await;
        self.seeder.clear(user_id).await?;
        self.users.delete_user(user_id).await?;
        Ok(())
    }
}
