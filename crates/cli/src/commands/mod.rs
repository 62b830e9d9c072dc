//! CLI subcommands.

pub mod catalog;
pub mod migrate;
pub mod orders;

use bazaar_core::UserNameError;
use bazaar_storefront::backend::{BackendClient, BackendError};
use bazaar_storefront::config::{BackendConfig, ConfigError};
use thiserror::Error;

/// Errors from commands that talk to the hosted data API.
#[derive(Debug, Error)]
pub enum BackendCommandError {
    /// Backend settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// The user name argument is malformed.
    #[error("Invalid user name: {0}")]
    InvalidUserName(#[from] UserNameError),
}

/// Build a backend client from `BACKEND_URL` and `BACKEND_API_KEY`.
fn connect_backend() -> Result<BackendClient, BackendCommandError> {
    dotenvy::dotenv().ok();
    let config = BackendConfig::from_env()?;
    tracing::info!(url = %config.url, "Connecting to backend...");
    Ok(BackendClient::new(&config)?)
}
