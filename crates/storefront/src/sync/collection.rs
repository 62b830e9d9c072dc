//! The user-facing cart and wishlist state containers.

use std::marker::PhantomData;
use std::sync::Arc;

use bazaar_core::{Price, ProductId, Quantity, UserName};

use super::SyncError;
use super::kind::{CartKind, CollectionKind, WishlistKind};
use super::merge::{MergeEngine, MergePolicy, MergeReport};
use super::session::SessionTransition;
use super::snapshot::{SnapshotStore, load_entries, save_entries};
use crate::backend::{BackendError, Product, RemoteRow, RemoteStore, Table};
use crate::models::CartLine;

/// The shopper's cart.
pub type Cart = SyncedCollection<CartKind>;

/// The shopper's wishlist.
pub type Wishlist = SyncedCollection<WishlistKind>;

/// A collection mirrored to either the guest snapshot or the remote store.
///
/// As a guest, every mutation rewrites the whole snapshot. When signed in,
/// every mutation is applied in memory first and then issued against the
/// remote store; the in-memory change stands whether or not the remote call
/// succeeds, and the returned `SyncError` tells the caller the two may now
/// differ until the next [`reload`](Self::reload).
pub struct SyncedCollection<K: CollectionKind> {
    remote: Arc<dyn RemoteStore>,
    snapshots: Arc<dyn SnapshotStore>,
    merge: MergeEngine,
    user: Option<UserName>,
    entries: Vec<K::Entry>,
    kind: PhantomData<K>,
}

impl<K: CollectionKind> SyncedCollection<K> {
    /// Create an empty guest collection.
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        snapshots: Arc<dyn SnapshotStore>,
        policy: MergePolicy,
    ) -> Self {
        Self {
            merge: MergeEngine::new(Arc::clone(&remote), policy),
            remote,
            snapshots,
            user: None,
            entries: Vec::new(),
            kind: PhantomData,
        }
    }

    /// Load state for `user`, or the guest snapshot when `None`.
    ///
    /// Guest entries still present while signed in (left behind by a
    /// retained merge failure) are merged before the reload.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` if the reload fails; the collection is
    /// then empty.
    pub async fn init(&mut self, user: Option<&UserName>) -> Result<(), SyncError> {
        self.user = user.cloned();
        let guest: Vec<K::Entry> = load_entries(self.snapshots.as_ref(), K::SLOT).await;

        let Some(user) = user else {
            self.entries = guest;
            return Ok(());
        };

        if !guest.is_empty() {
            self.merge
                .merge_guest_into_remote::<K>(user, guest, self.snapshots.as_ref())
                .await;
        }
        self.reload().await
    }

    /// Adopt `entries` as the Merged View without touching either store.
    #[cfg(test)]
    fn restore(&mut self, user: Option<&UserName>, entries: Vec<K::Entry>) {
        self.user = user.cloned();
        self.entries = entries;
    }

    /// End the collection's lifecycle, handing back its entries.
    #[must_use]
    pub fn dispose(self) -> Vec<K::Entry> {
        self.entries
    }

    /// Current entries, in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[K::Entry] {
        &self.entries
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether mutations are mirrored to the remote store.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn contains(&self, product_id: ProductId) -> bool {
        self.entries.iter().any(|e| K::product_id(e) == product_id)
    }

    /// React to a session transition.
    ///
    /// `Login` merges the guest snapshot into the user's rows, then replaces
    /// the in-memory state with a fresh remote reload. `Logout` empties the
    /// collection and deletes the snapshot; nothing from before the login
    /// comes back.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` if the post-login reload fails, or
    /// `SyncError::Snapshot` if the snapshot cannot be deleted on logout.
    pub async fn on_transition(
        &mut self,
        transition: &SessionTransition,
    ) -> Result<Option<MergeReport>, SyncError> {
        match transition {
            SessionTransition::Login(user) => {
                let guest: Vec<K::Entry> = load_entries(self.snapshots.as_ref(), K::SLOT).await;
                self.user = Some(user.name.clone());
                let report = self
                    .merge
                    .merge_guest_into_remote::<K>(&user.name, guest, self.snapshots.as_ref())
                    .await;
                self.reload().await?;
                Ok(Some(report))
            }
            SessionTransition::Logout => {
                self.user = None;
                self.entries.clear();
                self.snapshots.remove(K::SLOT).await?;
                Ok(None)
            }
        }
    }

    /// Add one `product`.
    ///
    /// When signed in, reads the user's current row for the product and
    /// updates or inserts it.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the snapshot write or a remote call fails. The
    /// in-memory state already includes the addition.
    pub async fn add_entry(&mut self, product: &Product) -> Result<(), SyncError> {
        let Some(delta) = K::add_local(&mut self.entries, product) else {
            return Ok(());
        };

        let Some(user) = &self.user else {
            return self.persist_guest().await;
        };

        let rows = self
            .remote
            .get_rows(K::TABLE, user)
            .await
            .map_err(SyncError::remote(K::TABLE))?;
        let existing = rows.iter().find(|r| r.product_id == product.id);
        self.merge
            .apply::<K>(user, existing, &delta)
            .await
            .map_err(SyncError::remote(K::TABLE))?;
        Ok(())
    }

    /// Remove `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the snapshot write or the remote delete fails.
    pub async fn remove_entry(&mut self, product_id: ProductId) -> Result<(), SyncError> {
        self.entries.retain(|e| K::product_id(e) != product_id);

        match &self.user {
            None => self.persist_guest().await,
            Some(user) => self
                .remote
                .delete_row(K::TABLE, user, product_id)
                .await
                .map_err(SyncError::remote(K::TABLE)),
        }
    }

    /// Empty the in-memory state.
    ///
    /// Never touches remote rows; a guest snapshot is rewritten as empty.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Snapshot` if the guest snapshot write fails.
    pub async fn clear(&mut self) -> Result<(), SyncError> {
        self.entries.clear();
        if self.user.is_none() {
            self.persist_guest().await?;
        }
        Ok(())
    }

    /// Rebuild the Merged View from the remote store.
    ///
    /// Discards the in-memory state, fetches the user's rows, resolves their
    /// products and replaces the entries wholesale. As a guest this rereads
    /// the snapshot instead.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` if either fetch fails; the collection is
    /// then empty.
    pub async fn reload(&mut self) -> Result<(), SyncError> {
        self.entries.clear();

        let Some(user) = &self.user else {
            self.entries = load_entries(self.snapshots.as_ref(), K::SLOT).await;
            return Ok(());
        };

        let rows = self
            .remote
            .get_rows(K::TABLE, user)
            .await
            .map_err(SyncError::remote(K::TABLE))?;

        let mut ids: Vec<ProductId> = rows.iter().map(|r| r.product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let products = if ids.is_empty() {
            Vec::new()
        } else {
            self.remote
                .get_products_by_ids(&ids)
                .await
                .map_err(SyncError::remote(K::TABLE))?
        };

        self.entries = K::rebuild(&rows, &products);
        tracing::debug!(table = %K::TABLE, user = %user, entries = self.entries.len(), "Reloaded from remote");
        Ok(())
    }

    async fn persist_guest(&self) -> Result<(), SyncError> {
        save_entries(self.snapshots.as_ref(), K::SLOT, &self.entries).await?;
        Ok(())
    }
}

impl<K: CollectionKind> std::fmt::Debug for SyncedCollection<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncedCollection")
            .field("table", &K::TABLE)
            .field("user", &self.user)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Cart-only operations
// =============================================================================

impl SyncedCollection<CartKind> {
    /// Set the quantity of a line already in the cart.
    ///
    /// `quantity <= 0` removes the line. Products not in the cart are left
    /// alone. When signed in, a missing remote row is recreated.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the snapshot write or a remote call fails.
    pub async fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<(), SyncError> {
        let Some(quantity) = Quantity::from_signed(quantity) else {
            return self.remove_entry(product_id).await;
        };

        let Some(line) = self.entries.iter_mut().find(|l| l.id == product_id) else {
            return Ok(());
        };
        line.quantity = quantity;

        let Some(user) = &self.user else {
            return self.persist_guest().await;
        };

        match self
            .remote
            .update_row_quantity(Table::Cart, user, product_id, quantity)
            .await
        {
            Ok(_) => Ok(()),
            Err(BackendError::NotFound(_)) => self
                .remote
                .insert_row(Table::Cart, &RemoteRow::cart(user.clone(), product_id, quantity))
                .await
                .map(|_| ())
                .map_err(SyncError::remote(Table::Cart)),
            Err(e) => Err(SyncError::remote(Table::Cart)(e)),
        }
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.entries.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.entries
            .iter()
            .map(|l| u64::from(l.quantity.get()))
            .sum()
    }

    /// Quantity of `product_id`, if present.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> Option<Quantity> {
        self.entries
            .iter()
            .find(|l| l.id == product_id)
            .map(|l| l.quantity)
    }
}

// =============================================================================
// Wishlist-only operations
// =============================================================================

impl SyncedCollection<WishlistKind> {
    /// Whether `product_id` is on the wishlist.
    #[must_use]
    pub fn is_member(&self, product_id: ProductId) -> bool {
        self.contains(product_id)
    }
}
