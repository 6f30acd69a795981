pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod ipc;
pub mod models;
pub mod seed;
pub mod store;
pub mod users;

pub use auth::{AuthIdentity, AuthSessions, InMemoryAuthSessions};
pub use config::TrialgateConfig;
pub use error::{SessionError, TrialgateError};
pub use models::session::DemoSession;
pub use models::user::DemoUser;
pub use seed::{DemoSeeder, InMemoryDemoSeeder, PgDemoSeeder};
pub use store::{InMemorySessionStore, SessionStore};
pub use users::{InMemoryUserStore, PgUserStore, UserStore};
