//! Cart and wishlist synchronization.
//!
//! # Architecture
//!
//! - [`SessionBoundary`] knows who is signed in and returns one
//!   [`SessionTransition`] per change
//! - [`SyncedCollection`] (aliased as [`Cart`] and [`Wishlist`]) holds the
//!   Merged View; as a guest it persists to a [`SnapshotStore`], when signed
//!   in it mirrors each mutation to the [`RemoteStore`](crate::backend::RemoteStore)
//! - [`MergeEngine`] folds the guest snapshot into the user's rows on `Login`
//! - [`CollectionKind`] captures the cart/wishlist differences: additive
//!   quantities versus set membership
//!
//! # Example
//!
//! ```rust,ignore
//! let mut boundary = SessionBoundary::new(None);
//! let mut cart = Cart::new(remote, snapshots, MergePolicy::DropFailed);
//! cart.init(None).await?;
//!
//! cart.add_entry(&product).await?;
//!
//! for transition in boundary.sign_in(user) {
//!     cart.on_transition(&transition).await?;
//! }
//! ```

mod collection;
mod kind;
mod merge;
mod session;
mod snapshot;

pub use collection::{Cart, SyncedCollection, Wishlist};
pub use kind::{CartKind, CollectionKind, MergeAction, WishlistKind};
pub use merge::{MergeEngine, MergePolicy, MergeReport};
pub use session::{SessionBoundary, SessionTransition};
pub use snapshot::{
    MemorySnapshots, SessionSnapshots, SnapshotError, SnapshotSlot, SnapshotStore, load_entries,
    save_entries,
};

use thiserror::Error;

use crate::backend::{BackendError, Table};

/// Errors from a synchronized collection.
///
/// Neither variant means the in-memory state is wrong; both mean it may no
/// longer match what is persisted.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote store call failed.
    #[error("remote {table} call failed: {source}")]
    Remote {
        /// Table the call targeted.
        table: Table,
        /// Underlying failure.
        #[source]
        source: BackendError,
    },

    /// The guest snapshot could not be written or removed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl SyncError {
    /// Wrap a backend error for `table`.
    pub(crate) fn remote(table: Table) -> impl FnOnce(BackendError) -> Self {
        move |source| Self::Remote { table, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_display() {
        let err = SyncError::remote(Table::Wishlist)(BackendError::Unavailable("down".to_string()));
        assert_eq!(
            err.to_string(),
            "remote wishlist call failed: backend unavailable: down"
        );
    }
}
