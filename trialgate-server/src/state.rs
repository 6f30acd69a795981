use std::sync::Arc;

use sqlx::PgPool;

use trialgate_core::auth::AuthSessions;
use trialgate_core::TrialgateConfig;

use crate::subsystems::lifecycle::DemoLifecycle;

/// Shared state for the HTTP handlers and the admin IPC server.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<DemoLifecycle>,
    pub auth: Arc<dyn AuthSessions>,
    pub pool: PgPool,
    pub config: TrialgateConfig,
}
