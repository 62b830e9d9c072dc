//! Order inspection.

use bazaar_core::UserName;
use bazaar_storefront::services::checkout::CheckoutService;

use super::{BackendCommandError, connect_backend};

/// Print `user`'s orders, newest first.
///
/// # Errors
///
/// Returns an error if the user name is malformed, the backend is not
/// configured, or the fetch fails.
pub async fn list(user: &str) -> Result<(), BackendCommandError> {
    let user = UserName::parse(user)?;
    let client = connect_backend()?;
    let orders = CheckoutService::new(&client).order_history(&user).await?;

    #[allow(clippy::print_stdout)]
    {
        for order in &orders {
            let placed = order
                .created_at
                .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string());
            println!(
                "#{:<6} {}  {:>10}  {:<9}  {} line(s)",
                order.id,
                placed,
                order.total.to_string(),
                order.status,
                order.items.len(),
            );
        }
        println!("{} order(s) for {user}", orders.len());
    }
    Ok(())
}
