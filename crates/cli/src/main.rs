//! Hugscape CLI - Drive the storefront client core from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! hugscape products --category boys --min-price 10
//! hugscape product 42
//!
//! # Work with the persisted cart
//! hugscape cart add 42 --size M --color Red --quantity 2
//! hugscape cart show
//!
//! # Sign in: open the printed URL, then hand the redirect query back
//! hugscape login
//! hugscape callback '?token=...&user=...'
//! hugscape whoami
//! ```
//!
//! # Commands
//!
//! - `products`, `product`, `categories`, `brands` - Catalog queries
//! - `cart` - Show or change the cart
//! - `login`, `callback`, `whoami`, `refresh`, `logout`, `profile` - Session
//!
//! Cart and token are persisted under `HUGSCAPE_STORAGE_DIR`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use hugscape_core::ProductId;
use hugscape_storefront::telemetry;
use rust_decimal::Decimal;

mod commands;

use commands::{CommandError, Context};

#[derive(Parser)]
#[command(name = "hugscape")]
#[command(author, version, about = "Hugscape storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products, optionally filtered
    Products {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        brand: Option<String>,

        #[arg(long)]
        min_price: Option<Decimal>,

        #[arg(long)]
        max_price: Option<Decimal>,

        #[arg(long)]
        size: Option<String>,

        /// Free-text search term
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product
    Product { id: ProductId },
    /// List known categories
    Categories,
    /// List known brands
    Brands,
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Print the identity-provider sign-in URL
    Login,
    /// Complete sign-in from the redirect's query string
    Callback { query: String },
    /// Show the signed-in user
    Whoami,
    /// Exchange the session token for a fresh one
    Refresh,
    /// Sign out and forget the token
    Logout,
    /// Update profile fields
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        given_name: Option<String>,

        #[arg(long)]
        family_name: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and totals
    Show,
    /// Add units of a product variant
    Add {
        id: ProductId,

        #[arg(long)]
        size: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of every line of a product (0 or less removes it)
    Set {
        id: ProductId,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove every line of a product
    Remove { id: ProductId },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let context = match Context::load() {
        Ok(context) => context,
        Err(e) => {
            telemetry::init_tracing(commands::LOG_FILTER);
            tracing::error!("Startup failed: {e}");
            std::process::exit(1);
        }
    };

    let _sentry_guard = telemetry::init_sentry(context.config());
    telemetry::init_tracing(commands::LOG_FILTER);

    if let Err(e) = run(&context, cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(context: &Context, cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Products {
            category,
            brand,
            min_price,
            max_price,
            size,
            search,
        } => {
            let filters = commands::catalog::ProductFilters {
                category,
                brand,
                min_price,
                max_price,
                size,
                search,
            };
            commands::catalog::products(context, filters).await?;
        }
        Commands::Product { id } => commands::catalog::product(context, id).await?,
        Commands::Categories => commands::catalog::categories(context).await?,
        Commands::Brands => commands::catalog::brands(context).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(context),
            CartAction::Add {
                id,
                size,
                color,
                quantity,
            } => {
                commands::cart::add(context, id, size.as_deref(), color.as_deref(), quantity)
                    .await?;
            }
            CartAction::Set { id, quantity } => commands::cart::set(context, id, quantity),
            CartAction::Remove { id } => commands::cart::remove(context, id),
            CartAction::Clear => commands::cart::clear(context),
        },
        Commands::Login => commands::session::login(context),
        Commands::Callback { query } => commands::session::callback(context, &query)?,
        Commands::Whoami => commands::session::whoami(context).await?,
        Commands::Refresh => commands::session::refresh(context).await?,
        Commands::Logout => commands::session::logout(context),
        Commands::Profile {
            name,
            given_name,
            family_name,
        } => {
            commands::session::update_profile(context, name, given_name, family_name).await?;
        }
    }
    Ok(())
}
