//! Foilbox CLI - operator tools for a file-backed Foilbox store.
//!
//! # Usage
//!
//! ```bash
//! # Load catalog, coupons and customer data
//! fb-cli seed demos/seed.yaml
//!
//! # Inventory
//! fb-cli stock list
//! fb-cli stock low
//!
//! # Orders
//! fb-cli order list --customer cust-1
//! fb-cli order advance ORD-...
//! fb-cli order cancel ORD-...
//!
//! # Check a coupon code for a customer
//! fb-cli coupon check SPRING10 --customer cust-1 --order-value 120
//!
//! # Validate and place an order from a JSON request
//! fb-cli checkout request.json
//! ```
//!
//! # Environment Variables
//!
//! - `FOILBOX_DATA_DIR` - Directory holding the JSON documents (default `./data`)
//! - `FOILBOX_*` - Checkout limits, see `CheckoutConfig::from_env`
//! - `RUST_LOG` - Log filter (default `foilbox_checkout=info,foilbox_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "fb-cli")]
#[command(author, version, about = "Foilbox store tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load documents from a YAML seed file
    Seed {
        /// Path to the seed file
        file: String,

        /// Replace existing documents instead of merging by ID
        #[arg(long)]
        replace: bool,
    },
    /// Inspect catalog inventory
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
    /// Inspect and move orders through their lifecycle
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Inspect coupons
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Validate a checkout request and place the order
    Checkout {
        /// Path to a JSON checkout request
        file: String,

        /// Only validate and print the quote
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum StockAction {
    /// List every catalog item
    List,
    /// List items at or below the low-stock threshold
    Low,
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders, optionally for one customer
    List {
        #[arg(short, long)]
        customer: Option<String>,
    },
    /// Show one order
    Show { id: String },
    /// Move an order to its next status
    Advance { id: String },
    /// Cancel an order and restock its items
    Cancel { id: String },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Check whether a code can be used
    Check {
        code: String,

        #[arg(short, long)]
        customer: Option<String>,

        #[arg(short, long)]
        order_value: Option<Decimal>,
    },
    /// List coupons a customer can use right now
    List {
        #[arg(short, long)]
        customer: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foilbox_checkout=info,foilbox_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = commands::Context::open()?;

    match cli.command {
        Commands::Seed { file, replace } => commands::seed::from_file(&ctx, &file, replace).await?,
        Commands::Stock { action } => match action {
            StockAction::List => commands::stock::list(&ctx).await,
            StockAction::Low => commands::stock::low(&ctx).await,
        },
        Commands::Order { action } => match action {
            OrderAction::List { customer } => {
                commands::orders::list(&ctx, customer.as_deref()).await;
            }
            OrderAction::Show { id } => commands::orders::show(&ctx, &id).await?,
            OrderAction::Advance { id } => commands::orders::advance(&ctx, &id).await?,
            OrderAction::Cancel { id } => commands::orders::cancel(&ctx, &id).await?,
        },
        Commands::Coupon { action } => match action {
            CouponAction::Check {
                code,
                customer,
                order_value,
            } => commands::coupons::check(&ctx, &code, customer.as_deref(), order_value).await?,
            CouponAction::List { customer } => commands::coupons::list(&ctx, &customer).await,
        },
        Commands::Checkout { file, dry_run } => {
            commands::checkout::from_file(&ctx, &file, dry_run).await?;
        }
    }
    Ok(())
}
