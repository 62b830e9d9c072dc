//! Session boundary: who is signed in, and when that changes.

use crate::models::CurrentUser;

/// A change in authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransition {
    /// Guest became `user`.
    Login(CurrentUser),
    /// The signed-in user left.
    Logout,
}

/// Tracks the current identity and reports transitions.
///
/// Emits exactly one transition per state change. Switching directly from
/// one user to another is a `Logout` followed by a `Login`. The boundary has
/// no side effects of its own; the caller hands each returned transition to
/// every collection's `on_transition`.
#[derive(Debug, Clone, Default)]
pub struct SessionBoundary {
    identity: Option<CurrentUser>,
}

impl SessionBoundary {
    /// Start from a known identity (or none, for a guest).
    #[must_use]
    pub const fn new(identity: Option<CurrentUser>) -> Self {
        Self { identity }
    }

    /// Whether someone is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// The signed-in user.
    #[must_use]
    pub const fn identity(&self) -> Option<&CurrentUser> {
        self.identity.as_ref()
    }

    /// Sign `user` in. Returns the transitions that were emitted, in order.
    pub fn sign_in(&mut self, user: CurrentUser) -> Vec<SessionTransition> {
        if self.identity.as_ref().is_some_and(|current| current.name == user.name) {
            self.identity = Some(user);
            return Vec::new();
        }

        let mut emitted: Vec<_> = self.sign_out().into_iter().collect();
        self.identity = Some(user.clone());
        emitted.push(SessionTransition::Login(user));
        emitted
    }

    /// Sign the current user out. Returns `None` if nobody was signed in.
    pub fn sign_out(&mut self) -> Option<SessionTransition> {
        self.identity.take()?;
        Some(SessionTransition::Logout)
    }
}
