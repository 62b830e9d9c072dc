//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid user name format.
    #[error("invalid user name: {0}")]
    InvalidUserName(#[from] bazaar_core::UserNameError),

    /// No password supplied.
    #[error("password is required")]
    MissingPassword,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The credential lookup failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}
