//! What differs between the cart and the wishlist.
//!
//! The cart is additive: adding an owned product bumps its quantity, and a
//! merge adds the guest quantity on top of the remote one. The wishlist is a
//! set: adding an owned product does nothing, and a merge never touches an
//! existing remote row.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

use bazaar_core::{ProductId, Quantity, UserName};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::snapshot::SnapshotSlot;
use crate::backend::{Product, RemoteRow, Table};
use crate::models::CartLine;

/// The remote write that reconciles one local entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAction {
    /// No row exists yet.
    Insert(RemoteRow),
    /// Set the existing row's quantity.
    Update(Quantity),
    /// The remote row already covers the entry.
    Skip,
}

/// Behaviour of one kind of synchronized collection.
pub trait CollectionKind: Send + Sync + 'static {
    /// An entry in the Merged View and in the guest snapshot.
    type Entry: Clone + Debug + Serialize + DeserializeOwned + Send + Sync;

    /// Remote table holding this collection's rows.
    const TABLE: Table;

    /// Snapshot slot holding the guest entries.
    const SLOT: SnapshotSlot;

    /// The product an entry refers to.
    fn product_id(entry: &Self::Entry) -> ProductId;

    /// Apply "add one `product`" to `entries`.
    ///
    /// Returns the entry to mirror remotely, or `None` if nothing changed.
    fn add_local(entries: &mut Vec<Self::Entry>, product: &Product) -> Option<Self::Entry>;

    /// The write that folds `entry` into the user's rows.
    fn merge_action(user: &UserName, existing: Option<&RemoteRow>, entry: &Self::Entry)
    -> MergeAction;

    /// Join rows with product metadata into a fresh Merged View.
    fn rebuild(rows: &[RemoteRow], products: &[Product]) -> Vec<Self::Entry>;
}

// =============================================================================
// Cart
// =============================================================================

/// Cart lines with quantities.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartKind;

impl CollectionKind for CartKind {
    type Entry = CartLine;

    const TABLE: Table = Table::Cart;
    const SLOT: SnapshotSlot = SnapshotSlot::Cart;

    fn product_id(entry: &CartLine) -> ProductId {
        entry.id
    }

    fn add_local(entries: &mut Vec<CartLine>, product: &Product) -> Option<CartLine> {
        match entries.iter_mut().find(|line| line.id == product.id) {
            Some(line) => line.quantity = line.quantity.increment(),
            None => entries.push(CartLine::from_product(product, Quantity::ONE)),
        }
        Some(CartLine::from_product(product, Quantity::ONE))
    }

    fn merge_action(user: &UserName, existing: Option<&RemoteRow>, entry: &CartLine) -> MergeAction {
        match existing {
            // A row stored without a positive quantity counts as zero.
            Some(row) => MergeAction::Update(
                row.quantity
                    .map_or(entry.quantity, |remote| remote.saturating_add(entry.quantity)),
            ),
            None => MergeAction::Insert(RemoteRow::cart(user.clone(), entry.id, entry.quantity)),
        }
    }

    fn rebuild(rows: &[RemoteRow], products: &[Product]) -> Vec<CartLine> {
        join_rows(rows, products, |row, product| {
            let Some(quantity) = row.quantity else {
                tracing::warn!(product_id = %row.product_id, "Skipping cart row without a quantity");
                return None;
            };
            Some(CartLine::from_product(product, quantity))
        })
    }
}

// =============================================================================
// Wishlist
// =============================================================================

/// Wishlisted products.
#[derive(Debug, Clone, Copy, Default)]
pub struct WishlistKind;

impl CollectionKind for WishlistKind {
    type Entry = Product;

    const TABLE: Table = Table::Wishlist;
    const SLOT: SnapshotSlot = SnapshotSlot::Wishlist;

    fn product_id(entry: &Product) -> ProductId {
        entry.id
    }

    fn add_local(entries: &mut Vec<Product>, product: &Product) -> Option<Product> {
        if entries.iter().any(|p| p.id == product.id) {
            return None;
        }
        entries.push(product.clone());
        Some(product.clone())
    }

    fn merge_action(user: &UserName, existing: Option<&RemoteRow>, entry: &Product) -> MergeAction {
        match existing {
            Some(_) => MergeAction::Skip,
            None => MergeAction::Insert(RemoteRow::wishlist(user.clone(), entry.id)),
        }
    }

    fn rebuild(rows: &[RemoteRow], products: &[Product]) -> Vec<Product> {
        join_rows(rows, products, |_, product| Some(product.clone()))
    }
}

/// Rows in order, first row per product, rows for unknown products skipped.
fn join_rows<T>(
    rows: &[RemoteRow],
    products: &[Product],
    build: impl Fn(&RemoteRow, &Product) -> Option<T>,
) -> Vec<T> {
    let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut seen = HashSet::new();

    rows.iter()
        .filter(|row| seen.insert(row.product_id))
        .filter_map(|row| {
            let Some(product) = by_id.get(&row.product_id) else {
                tracing::warn!(product_id = %row.product_id, "Skipping row for unknown product");
                return None;
            };
            build(row, product)
        })
        .collect()
}
