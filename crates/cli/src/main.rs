//! Gemcase CLI - Database migrations and collection inspection.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! gemcase migrate
//!
//! # Show a signed-in shopper's cart and wishlist
//! gemcase collections show --owner 6f1c2a4e-0b7d-4c55-9a55-3f1b2e8d9c10
//!
//! # Show only the wishlist
//! gemcase collections show --owner 6f1c2a4e-0b7d-4c55-9a55-3f1b2e8d9c10 --kind wishlist
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run storefront database migrations
//! - `collections show` - Print an owner's stored collections

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};
use gemcase_core::CollectionKind;
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "gemcase")]
#[command(author, version, about = "Gemcase CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Inspect stored collections
    Collections {
        #[command(subcommand)]
        action: CollectionsAction,
    },
}

#[derive(Subcommand)]
enum CollectionsAction {
    /// Print an owner's cart and wishlist
    Show {
        /// Owner (user) id
        #[arg(short, long)]
        owner: Uuid,

        /// Only show one collection
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Cart,
    Wishlist,
}

impl From<KindArg> for CollectionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Cart => Self::Cart,
            KindArg::Wishlist => Self::Wishlist,
        }
    }
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Collections { action } => match action {
            CollectionsAction::Show { owner, kind } => {
                let kinds = kind.map_or_else(
                    || CollectionKind::ALL.to_vec(),
                    |kind| vec![kind.into()],
                );
                commands::collections::show(owner, &kinds).await?;
            }
        },
    }
    Ok(())
}
