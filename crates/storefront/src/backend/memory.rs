//! In-process implementation of [`RemoteStore`].
//!
//! Backs demo mode (`STOREFRONT_BACKEND=memory`) and tests. Rows follow the
//! same rules as the hosted tables: `(user_name, product_id)` is unique and
//! a second insert for the same pair is rejected.
//!
//! With the `test-util` feature every call is journaled and failures can be
//! injected per product or globally.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bazaar_core::{OrderId, Price, ProductId, Quantity, UserId, UserName};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};

use super::types::{NewOrder, Order, Product, RemoteRow, User};
use super::{BackendError, RemoteStore, Table};

/// A call received by [`InMemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    GetRows { table: Table, user: UserName },
    InsertRow { table: Table, product_id: ProductId, quantity: Option<Quantity> },
    UpdateRowQuantity { table: Table, product_id: ProductId, quantity: Quantity },
    DeleteRow { table: Table, product_id: ProductId },
    DeleteRowsForUser { table: Table, user: UserName },
    GetProducts,
    CreateOrder { user: UserName },
    GetOrders { user: UserName },
    FindUser { user: UserName },
}

impl RemoteCall {
    /// Whether this call touches the `cart` or `wishlist` tables.
    #[must_use]
    pub const fn is_row_call(&self) -> bool {
        matches!(
            self,
            Self::GetRows { .. }
                | Self::InsertRow { .. }
                | Self::UpdateRowQuantity { .. }
                | Self::DeleteRow { .. }
                | Self::DeleteRowsForUser { .. }
        )
    }

    /// The product a row write targets.
    #[must_use]
    pub const fn product_id(&self) -> Option<ProductId> {
        match self {
            Self::InsertRow { product_id, .. }
            | Self::UpdateRowQuantity { product_id, .. }
            | Self::DeleteRow { product_id, .. } => Some(*product_id),
            _ => None,
        }
    }
}

/// In-process backend. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    products: BTreeMap<ProductId, Product>,
    users: Vec<(User, SecretString)>,
    cart: Vec<RemoteRow>,
    wishlist: Vec<RemoteRow>,
    orders: Vec<Order>,
    next_order_id: i64,
    #[cfg(any(test, feature = "test-util"))]
    calls: Vec<RemoteCall>,
    #[cfg(any(test, feature = "test-util"))]
    failing_products: HashSet<ProductId>,
    #[cfg(any(test, feature = "test-util"))]
    fail_all: bool,
    #[cfg(any(test, feature = "test-util"))]
    fail_orders: bool,
}

impl MemoryState {
    const fn rows(&self, table: Table) -> &Vec<RemoteRow> {
        match table {
            Table::Cart => &self.cart,
            Table::Wishlist => &self.wishlist,
        }
    }

    const fn rows_mut(&mut self, table: Table) -> &mut Vec<RemoteRow> {
        match table {
            Table::Cart => &mut self.cart,
            Table::Wishlist => &mut self.wishlist,
        }
    }

    #[cfg(any(test, feature = "test-util"))]
    fn enter(&mut self, call: RemoteCall) -> Result<(), BackendError> {
        let product = call.product_id();
        let order = matches!(call, RemoteCall::CreateOrder { .. });
        self.calls.push(call);
        if self.fail_all
            || (order && self.fail_orders)
            || product.is_some_and(|id| self.failing_products.contains(&id))
        {
            return Err(BackendError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }

    #[cfg(not(any(test, feature = "test-util")))]
    #[allow(clippy::unnecessary_wraps, clippy::unused_self, clippy::needless_pass_by_value)]
    fn enter(&mut self, _call: RemoteCall) -> Result<(), BackendError> {
        Ok(())
    }
}

impl InMemoryBackend {
    /// An empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend seeded with a small catalog and a `demo` / `demo1234` user.
    #[must_use]
    pub fn demo() -> Self {
        let catalog = [
            (1, "Enamel Camp Mug", 1450, "kitchen"),
            (2, "Pour-Over Kettle", 4200, "kitchen"),
            (3, "Linen Apron", 2800, "kitchen"),
            (4, "Canvas Tote", 1900, "bags"),
            (5, "Waxed Daypack", 8900, "bags"),
            (6, "Dot Grid Notebook", 1200, "stationery"),
            (7, "Brass Pen", 3400, "stationery"),
        ];

        let mut backend = Self::new();
        for (id, title, cents, category) in catalog {
            backend = backend.with_product(Product {
                id: ProductId::new(id),
                title: title.to_string(),
                price: Price::from_cents(cents),
                image: Some(format!("/static/products/{id}.jpg")),
                category: Some(category.to_string()),
                description: None,
            });
        }

        if let Ok(name) = UserName::parse("demo") {
            backend = backend.with_user(
                User {
                    id: Some(UserId::new(1)),
                    name,
                    email: Some("demo@bazaar.test".to_string()),
                },
                "demo1234",
            );
        }

        backend
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a product to the catalog.
    #[must_use]
    pub fn with_product(self, product: Product) -> Self {
        self.state().products.insert(product.id, product);
        self
    }

    /// Add a user with a password.
    #[must_use]
    pub fn with_user(self, user: User, password: &str) -> Self {
        self.state()
            .users
            .push((user, SecretString::from(password.to_string())));
        self
    }

    /// Seed a row directly, bypassing the journal.
    #[must_use]
    pub fn with_row(self, table: Table, row: RemoteRow) -> Self {
        self.state().rows_mut(table).push(row);
        self
    }

    /// Rows in `table` belonging to `user`, in insertion order.
    #[must_use]
    pub fn rows(&self, table: Table, user: &UserName) -> Vec<RemoteRow> {
        self.state()
            .rows(table)
            .iter()
            .filter(|row| &row.user_name == user)
            .cloned()
            .collect()
    }

    /// Every stored order.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.state().orders.clone()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl InMemoryBackend {
    /// Calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state().calls.clone()
    }

    /// Forget the journaled calls.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Make every row write for `product_id` fail.
    pub fn fail_product(&self, product_id: ProductId) {
        self.state().failing_products.insert(product_id);
    }

    /// Make every call fail (or stop failing).
    pub fn fail_all(&self, fail: bool) {
        self.state().fail_all = fail;
    }

    /// Make order creation fail (or stop failing). Row calls are unaffected.
    pub fn fail_orders(&self, fail: bool) {
        self.state().fail_orders = fail;
    }
}

#[async_trait]
impl RemoteStore for InMemoryBackend {
    async fn get_rows(&self, table: Table, user: &UserName) -> Result<Vec<RemoteRow>, BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::GetRows {
            table,
            user: user.clone(),
        })?;
        Ok(state
            .rows(table)
            .iter()
            .filter(|row| &row.user_name == user)
            .cloned()
            .collect())
    }

    async fn insert_row(&self, table: Table, row: &RemoteRow) -> Result<RemoteRow, BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::InsertRow {
            table,
            product_id: row.product_id,
            quantity: row.quantity,
        })?;

        let rows = state.rows_mut(table);
        if rows
            .iter()
            .any(|r| r.user_name == row.user_name && r.product_id == row.product_id)
        {
            return Err(BackendError::Status {
                status: 409,
                body: format!("duplicate {table} row for product {}", row.product_id),
            });
        }
        rows.push(row.clone());
        Ok(row.clone())
    }

    async fn update_row_quantity(
        &self,
        table: Table,
        user: &UserName,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<RemoteRow, BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::UpdateRowQuantity {
            table,
            product_id,
            quantity,
        })?;

        let row = state
            .rows_mut(table)
            .iter_mut()
            .find(|r| &r.user_name == user && r.product_id == product_id)
            .ok_or_else(|| BackendError::NotFound(format!("{table} row for {user}/{product_id}")))?;
        row.quantity = Some(quantity);
        Ok(row.clone())
    }

    async fn delete_row(
        &self,
        table: Table,
        user: &UserName,
        product_id: ProductId,
    ) -> Result<(), BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::DeleteRow { table, product_id })?;
        state
            .rows_mut(table)
            .retain(|r| !(&r.user_name == user && r.product_id == product_id));
        Ok(())
    }

    async fn delete_rows_for_user(&self, table: Table, user: &UserName) -> Result<(), BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::DeleteRowsForUser {
            table,
            user: user.clone(),
        })?;
        state.rows_mut(table).retain(|r| &r.user_name != user);
        Ok(())
    }

    async fn get_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::GetProducts)?;
        let wanted: HashSet<_> = ids.iter().copied().collect();
        Ok(state
            .products
            .values()
            .filter(|p| wanted.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn get_all_products(&self) -> Result<Vec<Product>, BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::GetProducts)?;
        Ok(state.products.values().cloned().collect())
    }

    async fn get_products_by_category(&self, category: &str) -> Result<Vec<Product>, BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::GetProducts)?;
        Ok(state
            .products
            .values()
            .filter(|p| p.category.as_deref() == Some(category))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::GetProducts)?;
        Ok(state.products.get(&id).cloned())
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::CreateOrder {
            user: order.user_name.clone(),
        })?;

        state.next_order_id += 1;
        let stored = Order {
            id: OrderId::new(state.next_order_id),
            user_name: order.user_name.clone(),
            items: order.items.clone(),
            total: order.total,
            status: order.status,
            created_at: Some(Utc::now()),
        };
        state.orders.push(stored.clone());
        Ok(stored)
    }

    async fn get_orders_by_user(&self, user: &UserName) -> Result<Vec<Order>, BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::GetOrders { user: user.clone() })?;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| &o.user_name == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn find_user(
        &self,
        name: &UserName,
        password: &SecretString,
    ) -> Result<Option<User>, BackendError> {
        let mut state = self.state();
        state.enter(RemoteCall::FindUser { user: name.clone() })?;
        Ok(state
            .users
            .iter()
            .find(|(user, pass)| {
                &user.name == name && pass.expose_secret() == password.expose_secret()
            })
            .map(|(user, _)| user.clone()))
    }
}
