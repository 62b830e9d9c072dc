//! `PostgreSQL` access for session storage.
//!
//! The storefront keeps no business data of its own; the hosted backend owns
//! products, rows and orders. A database is only needed when sessions must
//! survive restarts or be shared between instances.
//!
//! # Migrations
//!
//! The session table is created explicitly:
//! ```bash
//! cargo run -p bazaar-cli -- migrate sessions
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool for session storage.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
