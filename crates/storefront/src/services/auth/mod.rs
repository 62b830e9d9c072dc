//! Authentication service.
//!
//! Credentials are checked against the backend's `users` table; the
//! storefront never stores or hashes passwords itself.

mod error;

pub use error::AuthError;

use bazaar_core::UserName;
use secrecy::{ExposeSecret, SecretString};

use crate::backend::RemoteStore;
use crate::models::CurrentUser;

/// Authentication service.
pub struct AuthService<'a> {
    remote: &'a dyn RemoteStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(remote: &'a dyn RemoteStore) -> Self {
        Self { remote }
    }

    /// Login with user name and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUserName` or `AuthError::MissingPassword`
    /// for malformed input, `AuthError::InvalidCredentials` if the pair does
    /// not match a user, and `AuthError::Backend` if the lookup fails.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<CurrentUser, AuthError> {
        let name = UserName::parse(username)?;

        if password.expose_secret().is_empty() {
            return Err(AuthError::MissingPassword);
        }

        let user = self
            .remote
            .find_user(&name, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        tracing::info!(user = %user.name, "User authenticated");
        Ok(CurrentUser::from(user))
    }
}
