//! Periodic expiry sweeper.
//!
//! Reclaims sessions whose caller never came back to trigger lazy expiry.
//! Runs on a fixed interval independent of request traffic and shares the
//! lifecycle controller's teardown path. A failed teardown for one session
//! never aborts the rest of the sweep.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;

use trialgate_core::config::DemoConfig;

use super::lifecycle::DemoLifecycle;

/// Aggregate outcome of one sweep, for logs and the admin surface.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub scanned: usize,
    pub expired: usize,
    pub removed: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

pub async fn run_sweep(lifecycle: &DemoLifecycle) -> SweepReport {
    run_sweep_at(lifecycle, Utc::now()).await
}

pub async fn run_sweep_at(lifecycle: &DemoLifecycle, now: DateTime<Utc>) -> SweepReport {
    let start = std::time::Instant::now();
    let mut report = SweepReport::default();

    for session in lifecycle.sessions().await {
        report.scanned += 1;
        if !session.is_expired(now) {
            continue;
        }
        report.expired += 1;
        match lifecycle.teardown(session.user_id).await {
            Ok(()) => report.removed += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    user_id = %session.user_id,
                    session_id = %session.session_id,
                    error = %e,
                    "Sweep teardown failed; continuing with remaining sessions"
                );
            }
        }
    }

    report.elapsed_ms = start.elapsed().as_millis() as u64;

    if report.expired > 0 {
        tracing::info!(
            "Expiry sweep complete: {} scanned, {} expired, {} removed, {} failed in {}ms",
            report.scanned,
            report.expired,
            report.removed,
            report.failed,
            report.elapsed_ms
        );
    }

    report
}

/// Background loop started from main. Ticks at the configured interval and
/// stops when the shutdown broadcast fires.
pub async fn run_sweep_loop(
    lifecycle: Arc<DemoLifecycle>,
    config: DemoConfig,
    mut shutdown: broadcast::Receiver<()>,
) {
    let interval = tokio::time::Duration::from_secs(config.sweep_interval_minutes * 60);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(
        "Expiry sweep loop started (interval: {}min)",
        config.sweep_interval_minutes
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_sweep(&lifecycle).await;
            }
            _ = shutdown.recv() => {
                tracing::info!("Expiry sweep loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    use trialgate_core::seed::{DemoSeeder, InMemoryDemoSeeder};
    use trialgate_core::store::{InMemorySessionStore, SessionStore};
    use trialgate_core::users::{InMemoryUserStore, UserStore};

    fn t0() -> DateTime<Utc> {
        "2026-08-25T08:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn test_sweep_reclaims_only_expired_sessions() {
        let store = Arc::new(InMemorySessionStore::new());
        let users = Arc::new(InMemoryUserStore::new());
        let seeder = Arc::new(InMemoryDemoSeeder::new());
        let lifecycle = DemoLifecycle::new(
            store.clone(),
            users.clone(),
            seeder,
            DemoConfig::default(),
        );

        let (_, stale_user) = lifecycle.create_session_at(t0()).await.unwrap();
        let fresh_start = t0() + Duration::minutes(44);
        let (_, fresh_user) = lifecycle.create_session_at(fresh_start).await.unwrap();

        // 46 minutes after t0: the first session is past its 45-minute
        // lifetime, the second has plenty left.
        let sweep_time = t0() + Duration::minutes(46);
        let report = run_sweep_at(&lifecycle, sweep_time).await;

        assert_eq!(report.scanned, 2);
        assert_eq!(report.expired, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(report.failed, 0);

        assert!(users.find_user(stale_user.id).await.unwrap().is_none());
        assert!(store.get_by_user(stale_user.id).await.is_none());
        assert!(users.find_user(fresh_user.id).await.unwrap().is_some());
        assert!(store.get_by_user(fresh_user.id).await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_of_empty_store_is_quiet() {
        let lifecycle = DemoLifecycle::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryDemoSeeder::new()),
            DemoConfig::default(),
        );
        let report = run_sweep_at(&lifecycle, t0()).await;
        assert_eq!(report.scanned, 0);
        assert_eq!(report.expired, 0);
    }

    /// Seeder whose `clear` fails once, to prove per-session error
    /// isolation inside a sweep.
    struct FlakyClearSeeder {
        inner: InMemoryDemoSeeder,
        fail_once: AtomicBool,
    }

    #[async_trait]
    impl DemoSeeder for FlakyClearSeeder {
        async fn seed(&self, user_id: Uuid, session_id: Uuid) -> anyhow::Result<()> {
            self.inner.seed(user_id, session_id).await
        }

        async fn clear(&self, user_id: Uuid) -> anyhow::Result<()> {
            if self.fail_once.swap(false, Ordering::SeqCst) {
                anyhow::bail!("transient clear failure")
            }
            self.inner.clear(user_id).await
        }
    }

    #[tokio::test]
    async fn test_one_failed_teardown_does_not_abort_the_sweep() {
        let store = Arc::new(InMemorySessionStore::new());
        let users = Arc::new(InMemoryUserStore::new());
        let seeder = Arc::new(FlakyClearSeeder {
            inner: InMemoryDemoSeeder::new(),
            fail_once: AtomicBool::new(true),
        });
        let lifecycle = DemoLifecycle::new(
            store.clone(),
            users.clone(),
            seeder,
            DemoConfig::default(),
        );

        lifecycle.create_session_at(t0()).await.unwrap();
        lifecycle.create_session_at(t0()).await.unwrap();

        let sweep_time = t0() + Duration::hours(1);
        let report = run_sweep_at(&lifecycle, sweep_time).await;

        assert_eq!(report.expired, 2);
        assert_eq!(report.removed, 1);
        assert_eq!(report.failed, 1);
        // Both records left the store regardless; the failed one only
        // leaked backing data, which a later reconciliation can retry.
        assert!(store.list_all().await.is_empty());
    }
}
