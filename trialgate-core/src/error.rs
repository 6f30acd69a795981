use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TrialgateError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IPC error: {0}")]
    Ipc(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Errors surfaced by the demo session lifecycle.
///
/// Each variant maps to a coarse, user-safe `kind()` string that crosses the
/// HTTP boundary; the underlying cause stays server-side in the logs.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("demo session expired")]
    Expired,

    #[error("no demo session for user {0}")]
    NotFound(Uuid),

    #[error("demo session creation failed")]
    Creation {
        #[source]
        source: anyhow::Error,
    },

    #[error("demo session teardown failed for user {user_id}")]
    Teardown {
        user_id: Uuid,
        #[source]
        source: anyhow::Error,
    },
}

impl SessionError {
    /// Stable machine-readable kind, used by clients to branch UI behavior
    /// (offer "start a new demo" vs. a generic re-login).
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Expired => "DEMO_SESSION_EXPIRED",
            SessionError::NotFound(_) => "DEMO_SESSION_NOT_FOUND",
            SessionError::Creation { .. } => "DEMO_SESSION_CREATE_FAILED",
            SessionError::Teardown { .. } => "DEMO_SESSION_TEARDOWN_FAILED",
        }
    }
}
