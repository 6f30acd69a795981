//! Admin IPC request routing.

use std::sync::Arc;

use chrono::Utc;

use trialgate_core::ipc::{AdminRequest, AdminResponse};

use crate::http::session_json;
use crate::state::AppState;
use crate::subsystems::sweeper;

pub async fn handle_request(request: AdminRequest, state: &Arc<AppState>) -> AdminResponse {
    match request {
        AdminRequest::Ping => AdminResponse::pong(),
        AdminRequest::Health => {
            match trialgate_core::db::health_check(&state.pool).await {
                Ok(pg_ver) => AdminResponse::ok(serde_json::json!({
                    "postgresql": pg_ver,
                    "active_sessions": state.lifecycle.sessions().await.len(),
                    "status": "healthy",
                })),
                Err(e) => AdminResponse::err(format!("DB health check failed: {}", e)),
            }
        }
        AdminRequest::Sessions => {
            let now = Utc::now();
            let sessions: Vec<serde_json::Value> = state
                .lifecycle
                .sessions()
                .await
                .iter()
                .map(|s| session_json(s, now))
                .collect();
            AdminResponse::ok(serde_json::json!({
                "count": sessions.len(),
                "sessions": sessions,
            }))
        }
        AdminRequest::Sweep => {
            let report = sweeper::run_sweep(&state.lifecycle).await;
            AdminResponse::ok(serde_json::json!({
                "scanned": report.scanned,
                "expired": report.expired,
                "removed": report.removed,
                "failed": report.failed,
                "elapsed_ms": report.elapsed_ms,
            }))
        }
        AdminRequest::EndSession { user_id } => {
            match state.lifecycle.end_session(user_id).await {
                Ok(ended) => {
                    if ended {
                        state.auth.revoke_user(user_id).await;
                    }
                    AdminResponse::ok(serde_json::json!({"ended": ended, "user_id": user_id}))
                }
                Err(e) => AdminResponse::err(e.to_string()),
            }
        }
    }
}
