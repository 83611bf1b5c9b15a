//! Hexmart CLI - drive the admin console and the storefront cart from a
//! terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from HEXMART_PASSWORD, or typed on stdin)
//! hexmart login -u admin@shop.tw
//!
//! # Browse and edit the admin catalog
//! hexmart products list --page 2
//! hexmart products create --title Tea --price 100 --origin-price 80 --enabled true
//! hexmart products edit p-1001 --price 90
//! hexmart products delete p-1001
//!
//! # Public catalog and cart
//! hexmart catalog list --category 茶葉
//! hexmart cart add p-1001 --qty 2
//! hexmart cart show
//! ```
//!
//! # Environment Variables
//!
//! - `HEXMART_API_BASE_URL`, `HEXMART_API_PATH` - backend location (required)
//! - `HEXMART_SESSION_FILE` - where the session cookie persists between runs
//! - `HEXMART_LOG_JSON` - emit JSON log lines instead of text
//! - `SENTRY_DSN` - report errors to Sentry

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "hexmart")]
#[command(author, version, about = "Hexmart catalog console and cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in to the admin console
    Login {
        /// Admin email address
        #[arg(short, long)]
        username: String,
    },
    /// Forget the stored session
    Logout,
    /// Check whether the stored session is still accepted
    Check,
    /// Manage catalog products (requires login)
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Browse the public catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List one page of products
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Create a product
    Create {
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Edit an existing product
    Edit {
        /// Product id
        #[arg(allow_hyphen_values = true)]
        id: String,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product
    Delete {
        /// Product id
        #[arg(allow_hyphen_values = true)]
        id: String,
    },
    /// Upload an image and print its hosted URL
    Upload {
        /// Image file
        file: PathBuf,
        /// MIME type sent with the file
        #[arg(long)]
        mime: Option<String>,
    },
}

/// Form inputs shared by `create` and `edit`. Omitted flags leave the
/// draft's value untouched.
#[derive(Args, Default)]
pub struct ProductFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub unit: Option<String>,
    #[arg(long)]
    pub origin_price: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
    /// `1`/`0`, `true`/`false` or `on`/`off`
    #[arg(long)]
    pub enabled: Option<String>,
    /// Main image URL
    #[arg(long)]
    pub image_url: Option<String>,
    /// Star rating, 1 to 5
    #[arg(long)]
    pub rating: Option<i64>,
    /// Upload a file and append it to the secondary images (repeatable)
    #[arg(long = "add-image")]
    pub add_images: Vec<PathBuf>,
    /// Drop the last secondary image before uploading new ones
    #[arg(long)]
    pub remove_last_image: bool,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List one page of the public catalog
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product to the cart
    Add {
        /// Product id
        product_id: String,
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        qty: i64,
    },
    /// Change a cart line's quantity
    Qty {
        /// Cart line id
        id: String,
        #[arg(allow_negative_numbers = true)]
        qty: i64,
    },
    /// Remove a cart line
    Remove {
        /// Cart line id
        id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|d| !d.is_empty())?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hexmart=info".into());

    let json = std::env::var("HEXMART_LOG_JSON").is_ok_and(|v| !v.is_empty());
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Login { username } => commands::auth::login(&username).await?,
        Commands::Logout => commands::auth::logout()?,
        Commands::Check => commands::auth::check().await?,
        Commands::Products { action } => match action {
            ProductAction::List { page } => commands::products::list(page).await?,
            ProductAction::Create { fields } => commands::products::create(&fields).await?,
            ProductAction::Edit { id, fields } => commands::products::edit(&id, &fields).await?,
            ProductAction::Delete { id } => commands::products::delete(&id).await?,
            ProductAction::Upload { file, mime } => {
                commands::products::upload(&file, mime).await?;
            }
        },
        Commands::Catalog { action } => match action {
            CatalogAction::List { page, category } => {
                commands::catalog::list(page, category).await?;
            }
            CatalogAction::Show { id } => commands::catalog::show(&id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show().await?,
            CartAction::Add { product_id, qty } => commands::cart::add(&product_id, qty).await?,
            CartAction::Qty { id, qty } => commands::cart::change_qty(&id, qty).await?,
            CartAction::Remove { id } => commands::cart::remove(&id).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_product_fields_parse() {
        let cli = Cli::try_parse_from([
            "hexmart", "products", "create", "--title", "Tea", "--price", "100",
            "--origin-price", "80", "--enabled", "1", "--add-image", "a.png",
        ])
        .unwrap();
        let Commands::Products { action: ProductAction::Create { fields } } = cli.command else {
            panic!("expected products create");
        };
        assert_eq!(fields.title.as_deref(), Some("Tea"));
        assert_eq!(fields.origin_price.as_deref(), Some("80"));
        assert_eq!(fields.add_images, vec![PathBuf::from("a.png")]);
        assert!(!fields.remove_last_image);
    }

    #[test]
    fn test_cart_qty_accepts_negative() {
        let cli = Cli::try_parse_from(["hexmart", "cart", "qty", "line-1", "-5"]).unwrap();
        let Commands::Cart { action: CartAction::Qty { id, qty } } = cli.command else {
            panic!("expected cart qty");
        };
        assert_eq!(id, "line-1");
        assert_eq!(qty, -5);
    }
}
