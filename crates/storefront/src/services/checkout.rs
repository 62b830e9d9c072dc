//! Checkout and order history.

use bazaar_core::{OrderStatus, UserName};
use thiserror::Error;

use crate::backend::{BackendError, NewOrder, Order, RemoteStore, Table};
use crate::sync::Cart;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing to buy.
    #[error("cart is empty")]
    EmptyCart,

    /// The cart is not bound to a signed-in user.
    #[error("checkout requires a signed-in user")]
    NotAuthenticated,

    /// The order could not be created; the cart is unchanged.
    #[error("order creation failed: {0}")]
    OrderFailed(#[source] BackendError),
}

/// Places orders and lists past ones.
pub struct CheckoutService<'a> {
    remote: &'a dyn RemoteStore,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(remote: &'a dyn RemoteStore) -> Self {
        Self { remote }
    }

    /// Turn `cart` into a completed order.
    ///
    /// On success the user's remote cart rows are deleted and the cart is
    /// emptied. A failure to delete the rows is logged and does not undo the
    /// order. If the order cannot be created nothing is cleared.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or `CheckoutError::NotAuthenticated`
    /// before contacting the backend, and `CheckoutError::OrderFailed` if the
    /// order is rejected.
    #[tracing::instrument(skip(self, cart), fields(user = %user, lines = cart.len()))]
    pub async fn place_order(&self, user: &UserName, cart: &mut Cart) -> Result<Order, CheckoutError> {
        if !cart.is_authenticated() {
            return Err(CheckoutError::NotAuthenticated);
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = NewOrder {
            user_name: user.clone(),
            items: cart.entries().to_vec(),
            total: cart.total_price().rounded(),
            status: OrderStatus::Completed,
        };

        let placed = self
            .remote
            .create_order(&order)
            .await
            .map_err(CheckoutError::OrderFailed)?;

        if let Err(e) = self.remote.delete_rows_for_user(Table::Cart, user).await {
            tracing::warn!(error = %e, order_id = %placed.id, "Order placed but remote cart rows were not cleared");
        }
        if let Err(e) = cart.clear().await {
            tracing::warn!(error = %e, "Failed to clear cart after checkout");
        }

        tracing::info!(order_id = %placed.id, total = %placed.total, "Order placed");
        Ok(placed)
    }

    /// `user`'s orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the orders cannot be fetched.
    pub async fn order_history(&self, user: &UserName) -> Result<Vec<Order>, BackendError> {
        let mut orders = self.remote.get_orders_by_user(user).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use bazaar_core::{Price, ProductId, Quantity};

    use super::*;
    use crate::backend::{InMemoryBackend, Product, RemoteRow};
    use crate::sync::{MemorySnapshots, MergePolicy};

    fn ali() -> UserName {
        UserName::parse("ali").unwrap()
    }

    fn backend() -> InMemoryBackend {
        InMemoryBackend::new()
            .with_product(Product {
                id: ProductId::new(1),
                title: "Mug".to_string(),
                price: Price::from_cents(333),
                image: None,
                category: None,
                description: None,
            })
            .with_row(
                Table::Cart,
                RemoteRow::cart(ali(), ProductId::new(1), Quantity::new(3).unwrap()),
            )
    }

    async fn signed_in_cart(backend: &InMemoryBackend) -> Cart {
        let mut cart = Cart::new(
            Arc::new(backend.clone()),
            Arc::new(MemorySnapshots::new()),
            MergePolicy::DropFailed,
        );
        cart.init(Some(&ali())).await.unwrap();
        cart
    }

    #[tokio::test]
    async fn test_checkout_creates_order_and_clears_cart() {
        let backend = backend();
        let mut cart = signed_in_cart(&backend).await;

        let order = CheckoutService::new(&backend)
            .place_order(&ali(), &mut cart)
            .await
            .unwrap();

        assert_eq!(order.total, Price::from_cents(999));
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.items.len(), 1);
        assert!(cart.is_empty());
        assert!(backend.rows(Table::Cart, &ali()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_order_leaves_cart_alone() {
        let backend = backend();
        let mut cart = signed_in_cart(&backend).await;
        backend.fail_all(true);

        let err = CheckoutService::new(&backend)
            .place_order(&ali(), &mut cart)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::OrderFailed(_)));
        assert_eq!(cart.len(), 1);
        backend.fail_all(false);
        assert_eq!(backend.rows(Table::Cart, &ali()).len(), 1);
        assert!(backend.orders().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let backend = InMemoryBackend::new();
        let mut cart = signed_in_cart(&backend).await;

        let err = CheckoutService::new(&backend)
            .place_order(&ali(), &mut cart)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_guest_cart_is_rejected() {
        let backend = backend();
        let mut cart = Cart::new(
            Arc::new(backend.clone()),
            Arc::new(MemorySnapshots::new()),
            MergePolicy::DropFailed,
        );

        let err = CheckoutService::new(&backend)
            .place_order(&ali(), &mut cart)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_order_history_newest_first() {
        let backend = backend();
        let service = CheckoutService::new(&backend);
        for _ in 0..2 {
            let mut cart = signed_in_cart(&backend).await;
            cart.add_entry(&backend.get_product(ProductId::new(1)).await.unwrap().unwrap())
                .await
                .unwrap();
            service.place_order(&ali(), &mut cart).await.unwrap();
        }

        let history = service.order_history(&ali()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].id > history[1].id);
    }
}
