//! Session middleware configuration.
//!
//! Sessions live in `PostgreSQL` (via tower-sessions-sqlx-store) when a
//! database URL is configured, and in process memory otherwise. Guest
//! snapshots and the signed-in identity are both stored in the session.

use async_trait::async_trait;
use sqlx::PgPool;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bazaar_session";

/// Session expiry after inactivity, in seconds (30 minutes).
pub const SESSION_INACTIVITY_SECONDS: i64 = 30 * 60;

/// Where session records are kept.
#[derive(Debug, Clone)]
pub enum SessionBackend {
    /// `PostgreSQL` table managed by the CLI migration.
    Postgres(PostgresStore),
    /// Process memory; sessions are lost on restart.
    Memory(MemoryStore),
}

impl SessionBackend {
    /// Pick the store for `pool`.
    #[must_use]
    pub fn new(pool: Option<&PgPool>) -> Self {
        match pool {
            Some(pool) => Self::Postgres(PostgresStore::new(pool.clone())),
            None => Self::Memory(MemoryStore::default()),
        }
    }
}

#[async_trait]
impl SessionStore for SessionBackend {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        match self {
            Self::Postgres(store) => store.create(record).await,
            Self::Memory(store) => store.create(record).await,
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        match self {
            Self::Postgres(store) => store.save(record).await,
            Self::Memory(store) => store.save(record).await,
        }
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        match self {
            Self::Postgres(store) => store.load(session_id).await,
            Self::Memory(store) => store.load(session_id).await,
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        match self {
            Self::Postgres(store) => store.delete(session_id).await,
            Self::Memory(store) => store.delete(session_id).await,
        }
    }
}

/// Create the session layer.
///
/// # Arguments
///
/// * `pool` - `PostgreSQL` connection pool, if sessions are persisted
/// * `config` - Storefront configuration (for the cookie `Secure` flag)
#[must_use]
pub fn create_session_layer(
    pool: Option<&PgPool>,
    config: &StorefrontConfig,
) -> SessionManagerLayer<SessionBackend> {
    // The sessions table must be created via `bazaar-cli migrate sessions`
    SessionManagerLayer::new(SessionBackend::new(pool))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_INACTIVITY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
