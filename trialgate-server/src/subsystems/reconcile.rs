//! Startup reconciliation.
//!
//! The session store is in-memory only; a process restart orphans every
//! ephemeral user that had a live session, because nothing remains to
//! trigger their cleanup. On boot we therefore delete any demo-flagged
//! user that has no session record. Runs before the server starts
//! accepting traffic, so the store is empty and every demo user found is
//! garbage by definition.

use trialgate_core::seed::DemoSeeder;
use trialgate_core::store::SessionStore;
use trialgate_core::users::UserStore;

#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub orphans: usize,
    pub removed: usize,
    pub failed: usize,
}

pub async fn reconcile_orphans(
    users: &dyn UserStore,
    store: &dyn SessionStore,
    seeder: &dyn DemoSeeder,
) -> anyhow::Result<ReconcileReport> {
    let mut report = ReconcileReport::default();

    for user_id in users.list_demo_user_ids().await? {
        if store.get_by_user(user_id).await.is_some() {
            continue;
        }
        report.orphans += 1;

        let result = async {
            seeder.clear(user_id).await?;
            users.delete_user(user_id).await
        }
        .await;

        match result {
            Ok(()) => report.removed += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Failed to remove orphaned demo user"
                );
            }
        }
    }

    if report.orphans > 0 {
        tracing::info!(
            "Startup reconciliation: {} orphaned demo users found, {} removed, {} failed",
            report.orphans,
            report.removed,
            report.failed
        );
    }

    Ok(report)
}
