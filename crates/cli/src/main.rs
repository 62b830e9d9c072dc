//! Bazaar CLI - session table migration and backend inspection.
//!
//! # Usage
//!
//! ```bash
//! # Create the PostgreSQL session table
//! bazaar-cli migrate sessions
//!
//! # List products, optionally in one category
//! bazaar-cli catalog list --category bags
//!
//! # List a user's orders, newest first
//! bazaar-cli orders list --user demo
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Inspect the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the tower-sessions table
    Sessions,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    List {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List a user's orders
    List {
        /// User name
        #[arg(short, long)]
        user: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Sessions => commands::migrate::sessions().await?,
        },
        Commands::Catalog { action } => match action {
            CatalogAction::List { category } => commands::catalog::list(category).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List { user } => commands::orders::list(&user).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_orders_list_requires_user() {
        assert!(Cli::try_parse_from(["bazaar-cli", "orders", "list"]).is_err());
        assert!(Cli::try_parse_from(["bazaar-cli", "orders", "list", "--user", "demo"]).is_ok());
    }
}
