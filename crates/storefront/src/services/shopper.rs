//! Per-request shopper context.
//!
//! A [`Shopper`] binds one visitor's session to their cart, wishlist and
//! [`SessionBoundary`]. Both collections are rebuilt on every request: guests
//! from the session snapshot, signed-in shoppers from their remote rows. The
//! Merged View therefore never outlives the request that loaded it.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;
use tower_sessions::Session;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;
use crate::sync::{
    Cart, MergeReport, SessionBoundary, SessionSnapshots, SnapshotStore, SyncError, Wishlist,
};

/// Merge outcome for both collections after a login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoginSummary {
    /// Cart merge counts.
    pub cart: MergeReport,
    /// Wishlist merge counts.
    pub wishlist: MergeReport,
}

/// One visitor's shopping state for the duration of a request.
pub struct Shopper {
    session: Session,
    boundary: SessionBoundary,
    cart: Cart,
    wishlist: Wishlist,
    synced: bool,
}

impl Shopper {
    /// Build the shopper for `session`.
    ///
    /// Remote failures while loading are logged and leave the affected
    /// collection empty; [`synced`](Self::synced) then reports `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session record cannot be read.
    pub async fn open(state: &AppState, session: Session) -> Result<Self, tower_sessions::session::Error> {
        let identity = current_user(&session).await?;
        let user = identity.as_ref().map(|u| u.name.clone());

        let snapshots: Arc<dyn SnapshotStore> = Arc::new(SessionSnapshots::new(session.clone()));
        let policy = state.config().merge_policy;
        let cart = Cart::new(Arc::clone(state.remote()), Arc::clone(&snapshots), policy);
        let wishlist = Wishlist::new(Arc::clone(state.remote()), snapshots, policy);

        let mut shopper = Self {
            session,
            boundary: SessionBoundary::new(identity),
            cart,
            wishlist,
            synced: true,
        };

        let loaded = shopper.cart.init(user.as_ref()).await;
        shopper.record(loaded);
        let loaded = shopper.wishlist.init(user.as_ref()).await;
        shopper.record(loaded);

        Ok(shopper)
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&CurrentUser> {
        self.boundary.identity()
    }

    /// The cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The cart, for mutation.
    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// The wishlist.
    #[must_use]
    pub const fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    /// The wishlist, for mutation.
    pub const fn wishlist_mut(&mut self) -> &mut Wishlist {
        &mut self.wishlist
    }

    /// Whether every remote call in this request succeeded.
    #[must_use]
    pub const fn synced(&self) -> bool {
        self.synced
    }

    /// Note the outcome of a collection operation. Failures are logged and
    /// the request carries on with the in-memory state.
    pub fn record(&mut self, outcome: Result<(), SyncError>) -> bool {
        match outcome {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Collection out of sync with its store");
                self.synced = false;
                false
            }
        }
    }

    /// Sign `user` in, merging the guest cart and wishlist into their rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be updated. Merge failures are
    /// reported in the summary, not as errors.
    pub async fn sign_in(&mut self, user: CurrentUser) -> Result<LoginSummary, tower_sessions::session::Error> {
        let mut summary = LoginSummary::default();
        for transition in self.boundary.sign_in(user.clone()) {
            let outcome = self.cart.on_transition(&transition).await;
            if let Some(report) = self.absorb(outcome) {
                summary.cart = report;
            }
            let outcome = self.wishlist.on_transition(&transition).await;
            if let Some(report) = self.absorb(outcome) {
                summary.wishlist = report;
            }
        }

        set_sentry_user(&user.name, user.email.as_deref());
        self.session.cycle_id().await?;
        set_current_user(&self.session, &user).await?;

        Ok(summary)
    }

    /// Sign out, leaving an empty guest cart and wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be updated.
    pub async fn sign_out(&mut self) -> Result<(), tower_sessions::session::Error> {
        if let Some(transition) = self.boundary.sign_out() {
            let outcome = self.cart.on_transition(&transition).await;
            self.absorb(outcome);
            let outcome = self.wishlist.on_transition(&transition).await;
            self.absorb(outcome);
        }

        clear_sentry_user();
        clear_current_user(&self.session).await?;
        self.session.cycle_id().await
    }

    fn absorb(&mut self, outcome: Result<Option<MergeReport>, SyncError>) -> Option<MergeReport> {
        match outcome {
            Ok(report) => report,
            Err(e) => {
                self.record(Err(e));
                None
            }
        }
    }
}

impl std::fmt::Debug for Shopper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shopper")
            .field("user", &self.user().map(|u| u.name.as_str()))
            .field("cart", &self.cart)
            .field("wishlist", &self.wishlist)
            .field("synced", &self.synced)
            .finish_non_exhaustive()
    }
}

impl FromRequestParts<AppState> for Shopper {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        Ok(Self::open(state, session).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{ProductId, Quantity, UserName};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::backend::{InMemoryBackend, Product, RemoteStore, Table};
    use crate::config::StorefrontConfig;

    fn state(remote: &InMemoryBackend) -> AppState {
        AppState::new(StorefrontConfig::in_memory(), Arc::new(remote.clone()), None)
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn demo_user() -> CurrentUser {
        CurrentUser::named(UserName::parse("demo").unwrap())
    }

    async fn product(remote: &InMemoryBackend, id: i64) -> Product {
        remote.get_product(ProductId::new(id)).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_guest_state_survives_across_requests() {
        let remote = InMemoryBackend::demo();
        let state = state(&remote);
        let session = session();

        let mut shopper = Shopper::open(&state, session.clone()).await.unwrap();
        let mug = product(&remote, 1).await;
        let added = shopper.cart_mut().add_entry(&mug).await;
        assert!(shopper.record(added));

        let shopper = Shopper::open(&state, session).await.unwrap();
        assert!(shopper.user().is_none());
        assert_eq!(shopper.cart().total_items(), 1);
        assert!(shopper.synced());
    }

    #[tokio::test]
    async fn test_sign_in_merges_guest_collections() {
        let remote = InMemoryBackend::demo();
        let state = state(&remote);
        let session = session();

        let mut shopper = Shopper::open(&state, session.clone()).await.unwrap();
        let mug = product(&remote, 1).await;
        let added = shopper.cart_mut().add_entry(&mug).await;
        shopper.record(added);
        let added = shopper.wishlist_mut().add_entry(&mug).await;
        shopper.record(added);

        let summary = shopper.sign_in(demo_user()).await.unwrap();
        assert_eq!(summary.cart.inserted, 1);
        assert_eq!(summary.wishlist.inserted, 1);
        assert_eq!(shopper.cart().total_items(), 1);
        assert!(shopper.wishlist().is_member(ProductId::new(1)));

        let shopper = Shopper::open(&state, session).await.unwrap();
        assert_eq!(shopper.user().map(|u| u.name.as_str()), Some("demo"));
        assert_eq!(shopper.cart().total_items(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_leaves_empty_guest() {
        let remote = InMemoryBackend::demo();
        let state = state(&remote);
        let session = session();

        let mut shopper = Shopper::open(&state, session.clone()).await.unwrap();
        shopper.sign_in(demo_user()).await.unwrap();
        let mug = product(&remote, 1).await;
        let added = shopper.cart_mut().add_entry(&mug).await;
        shopper.record(added);

        shopper.sign_out().await.unwrap();
        assert!(shopper.user().is_none());
        assert!(shopper.cart().is_empty());

        let shopper = Shopper::open(&state, session).await.unwrap();
        assert!(shopper.user().is_none());
        assert!(shopper.cart().is_empty());
        assert!(shopper.wishlist().is_empty());
    }

    #[tokio::test]
    async fn test_remote_failure_marks_unsynced() {
        let remote = InMemoryBackend::demo();
        let state = state(&remote);
        let session = session();
        set_current_user(&session, &demo_user()).await.unwrap();

        remote.fail_all(true);
        let shopper = Shopper::open(&state, session).await.unwrap();
        assert!(!shopper.synced());
        assert!(shopper.cart().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_sees_changes_from_another_session() {
        let remote = InMemoryBackend::demo();
        let state = state(&remote);
        let phone = session();
        let laptop = session();
        set_current_user(&phone, &demo_user()).await.unwrap();
        set_current_user(&laptop, &demo_user()).await.unwrap();
        let mug = product(&remote, 1).await;

        let shopper = Shopper::open(&state, phone.clone()).await.unwrap();
        assert!(shopper.cart().is_empty());

        let mut other = Shopper::open(&state, laptop).await.unwrap();
        let added = other.cart_mut().add_entry(&mug).await;
        assert!(other.record(added));

        let mut shopper = Shopper::open(&state, phone.clone()).await.unwrap();
        assert_eq!(shopper.cart().total_items(), 1);

        let added = shopper.cart_mut().add_entry(&mug).await;
        assert!(shopper.record(added));
        assert_eq!(shopper.cart().total_items(), 2);

        let user = demo_user().name;
        let rows = remote.rows(Table::Cart, &user);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().and_then(|r| r.quantity), Quantity::new(2));

        let shopper = Shopper::open(&state, phone).await.unwrap();
        assert_eq!(shopper.cart().total_items(), 2);
    }
}
