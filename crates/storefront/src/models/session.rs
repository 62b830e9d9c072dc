//! Session-related types.
//!
//! Types stored in the session for authentication state.

use bazaar_core::{UserId, UserName};
use serde::{Deserialize, Serialize};

use crate::backend::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Login name; the key for this user's remote rows.
    pub name: UserName,
    /// Backend user ID, when known.
    #[serde(default)]
    pub id: Option<UserId>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
}

impl CurrentUser {
    /// An identity with only a name.
    #[must_use]
    pub const fn named(name: UserName) -> Self {
        Self {
            name,
            id: None,
            email: None,
        }
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            id: user.id,
            email: user.email,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the guest cart snapshot.
    pub const CART_SNAPSHOT: &str = "cart";

    /// Key for the guest wishlist snapshot.
    pub const WISHLIST_SNAPSHOT: &str = "wishlist";
}
