//! Wire types for the hosted data API.
//!
//! Column names follow the backend tables (`user_name`, `product_id`, …).
//! Unknown columns such as row ids and timestamps on the `cart` table are
//! ignored on read.

use bazaar_core::{OrderId, OrderStatus, Price, ProductId, Quantity, UserId, UserName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::CartLine;

// =============================================================================
// Products
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Category name used for catalog filtering.
    #[serde(default)]
    pub category: Option<String>,
    /// Plain text description.
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Per-user rows
// =============================================================================

/// A row in the `cart` or `wishlist` table, unique per `(user_name, product_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRow {
    /// Owner of the row.
    pub user_name: UserName,
    /// Product the row refers to.
    pub product_id: ProductId,
    /// Quantity for cart rows; absent for wishlist rows.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_quantity"
    )]
    pub quantity: Option<Quantity>,
}

impl RemoteRow {
    /// A cart row.
    #[must_use]
    pub const fn cart(user_name: UserName, product_id: ProductId, quantity: Quantity) -> Self {
        Self {
            user_name,
            product_id,
            quantity: Some(quantity),
        }
    }

    /// A wishlist row.
    #[must_use]
    pub const fn wishlist(user_name: UserName, product_id: ProductId) -> Self {
        Self {
            user_name,
            product_id,
            quantity: None,
        }
    }

    /// The stored quantity, treating a missing value as one unit.
    #[must_use]
    pub fn quantity_or_one(&self) -> Quantity {
        self.quantity.unwrap_or(Quantity::ONE)
    }
}

/// Quantity body for `PATCH /cart`.
#[derive(Debug, Serialize)]
pub(crate) struct QuantityPatch {
    pub quantity: Quantity,
}

/// Reads a nullable integer; zero and negative values become `None`.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<Option<Quantity>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.and_then(Quantity::from_signed))
}

// =============================================================================
// Orders
// =============================================================================

/// An order to be created at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    /// Buyer.
    pub user_name: UserName,
    /// Purchased lines with the metadata shown at checkout time.
    pub items: Vec<CartLine>,
    /// Order total, rounded to two decimal places.
    pub total: Price,
    /// Initial status.
    pub status: OrderStatus,
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Buyer.
    pub user_name: UserName,
    /// Purchased lines. Older rows store this column as a JSON-encoded string.
    #[serde(default, deserialize_with = "items_array_or_string")]
    pub items: Vec<CartLine>,
    /// Order total.
    #[serde(default)]
    pub total: Price,
    /// Order status.
    #[serde(default)]
    pub status: OrderStatus,
    /// Creation timestamp.
    #[serde(default, alias = "date")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemsColumn {
    Lines(Vec<CartLine>),
    Encoded(String),
    Missing(()),
}

fn items_array_or_string<'de, D>(deserializer: D) -> Result<Vec<CartLine>, D::Error>
where
    D: Deserializer<'de>,
{
    match ItemsColumn::deserialize(deserializer)? {
        ItemsColumn::Lines(lines) => Ok(lines),
        ItemsColumn::Encoded(raw) => serde_json::from_str(&raw).map_err(serde::de::Error::custom),
        ItemsColumn::Missing(()) => Ok(Vec::new()),
    }
}

// =============================================================================
// Users
// =============================================================================

/// A user record from the `users` table.
///
/// The password column is never deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend row id, when the table exposes one.
    #[serde(default)]
    pub id: Option<UserId>,
    /// Login name; also the key for cart, wishlist and order rows.
    pub name: UserName,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_row_ignores_unknown_columns() {
        let row: RemoteRow = serde_json::from_str(
            r#"{"id": 12, "user_name": "ali", "product_id": 3, "quantity": 2, "created_at": "2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(row.product_id, ProductId::new(3));
        assert_eq!(row.quantity.map(Quantity::get), Some(2));
    }

    #[test]
    fn test_row_zero_or_null_quantity_is_none() {
        let row: RemoteRow =
            serde_json::from_str(r#"{"user_name": "ali", "product_id": 3, "quantity": 0}"#).unwrap();
        assert_eq!(row.quantity, None);
        assert_eq!(row.quantity_or_one(), Quantity::ONE);

        let row: RemoteRow =
            serde_json::from_str(r#"{"user_name": "ali", "product_id": 3, "quantity": null}"#)
                .unwrap();
        assert_eq!(row.quantity, None);
    }

    #[test]
    fn test_wishlist_row_serializes_without_quantity() {
        let row = RemoteRow::wishlist(UserName::parse("ali").unwrap(), ProductId::new(9));
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({"user_name": "ali", "product_id": 9}));
    }

    #[test]
    fn test_order_items_as_encoded_string() {
        let order: Order = serde_json::from_str(
            r#"{
                "id": 5,
                "user_name": "ali",
                "items": "[{\"id\": 1, \"title\": \"Mug\", \"price\": 4.5, \"quantity\": 2}]",
                "total": 9.0,
                "status": "completed",
                "created_at": "2025-03-04T10:00:00+00:00"
            }"#,
        )
        .unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity.get(), 2);
        assert_eq!(order.total, Price::from_cents(900));
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_order_items_as_array_and_missing_fields() {
        let order: Order = serde_json::from_str(
            r#"{"id": 6, "user_name": "ali", "items": [{"id": 2, "title": "Pen", "price": 1, "quantity": 1}], "date": "2025-03-04T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.total, Price::ZERO);
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_user_ignores_password_column() {
        let user: User =
            serde_json::from_str(r#"{"id": 1, "name": "ali", "pass": "hunter2", "email": null}"#)
                .unwrap();
        assert_eq!(user.name.as_str(), "ali");
        assert_eq!(user.email, None);
    }
}
