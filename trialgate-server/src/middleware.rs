//! Request-path middleware.
//!
//! Two layers, applied in order:
//! 1. `authenticate` — resolves `Authorization: Bearer <token>` into an
//!    `AuthIdentity` request extension. Requests without a valid token
//!    simply carry no identity; each handler decides whether that is fatal.
//! 2. `demo_guard` — gates routes that serve product data. Non-demo
//!    identities pass straight through with no session lookup. Demo
//!    identities get their session validated and touched; a dead session
//!    revokes the caller's auth token and rejects with the
//!    `DEMO_SESSION_EXPIRED` kind so clients can offer a fresh demo
//!    instead of a generic login prompt.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use trialgate_core::auth::AuthIdentity;
use trialgate_core::error::SessionError;

use crate::state::AppState;
use crate::subsystems::lifecycle::TouchOutcome;

/// The raw bearer token a request authenticated with, kept alongside the
/// identity so the guard can revoke exactly that token.
#[derive(Debug, Clone)]
pub struct AuthToken(pub String);

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()) {
        if let Some(identity) = state.auth.get(&token).await {
            req.extensions_mut().insert(identity);
            req.extensions_mut().insert(AuthToken(token));
        }
    }
    next.run(req).await
}

pub async fn demo_guard(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let identity = req.extensions().get::<AuthIdentity>().cloned();
    // Cloned out up front: the request body is !Sync, so holding a borrow
    // of `req` across the revoke await would make this future !Send.
    let token = req.extensions().get::<AuthToken>().cloned();

    let identity = match identity {
        Some(id) if id.is_demo => id,
        // Non-demo callers bypass entirely; unauthenticated requests are
        // the handlers' problem.
        _ => return next.run(req).await,
    };

    match state.lifecycle.touch_activity(identity.user_id).await {
        Ok(TouchOutcome::Touched { .. }) => next.run(req).await,
        Ok(TouchOutcome::NoSession) => {
            // Demo-flagged token with no backing session: the session was
            // reclaimed out from under it (sweep, restart, manual end).
            revoke_token(&state, token.as_ref()).await;
            expired_response()
        }
        Err(SessionError::Expired) => {
            revoke_token(&state, token.as_ref()).await;
            expired_response()
        }
        Err(e) => {
            tracing::error!(
                user_id = %identity.user_id,
                error = %e,
                "Demo session validation failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "error": "demo session validation failed",
                    "error_kind": e.kind(),
                })),
            )
                .into_response()
        }
    }
}

async fn revoke_token(state: &AppState, token: Option<&AuthToken>) {
    if let Some(AuthToken(token)) = token {
        state.auth.revoke(token).await;
    }
}

fn expired_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "status": "error",
            "error": "your demo session has ended",
            "error_kind": "DEMO_SESSION_EXPIRED",
            "action": "restart_demo",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracts_value() {
        let headers = headers_with("Bearer abc123");
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_bearer_token_rejects_empty_and_missing() {
        assert!(bearer_token(&HeaderMap::new()).is_none());
        assert!(bearer_token(&headers_with("Bearer ")).is_none());
    }
}
