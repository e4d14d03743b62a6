//! Collection inspection commands.
//!
//! Reads a signed-in shopper's collections straight from the storefront
//! database. Anonymous collections live in sessions and are not listed.

use chrono::{DateTime, Utc};
use gemcase_core::{CollectionKind, UserId};
use gemcase_storefront::db::{self, CollectionRepository};
use gemcase_storefront::sync::{Cart, CollectionState, RemoteCollections, Wishlist};
use uuid::Uuid;

use super::{CommandError, database_url};

/// Print the given collections for `owner`.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a row is invalid.
pub async fn show(owner: Uuid, kinds: &[CollectionKind]) -> Result<(), CommandError> {
    let pool = db::create_pool(&database_url()?).await?;
    let remote = RemoteCollections::new(CollectionRepository::new(pool));
    let owner = UserId::new(owner);

    for kind in kinds {
        let updated = remote.store().last_updated_for_owner(*kind, owner).await?;
        print_updated(*kind, updated);
        match kind {
            CollectionKind::Cart => {
                let cart = CollectionState::<Cart>::from_items(
                    remote.load_for_owner::<Cart>(owner).await?,
                );
                print_cart(owner, &cart);
            }
            CollectionKind::Wishlist => {
                let wishlist = CollectionState::<Wishlist>::from_items(
                    remote.load_for_owner::<Wishlist>(owner).await?,
                );
                print_wishlist(owner, &wishlist);
            }
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(owner: UserId, cart: &CollectionState<Cart>) {
    println!("Cart for {owner} ({} items)", cart.item_count());
    for item in cart.list() {
        println!(
            "  {:>3} x {:<32} {:>10}  [{}]",
            item.quantity.get(),
            item.product.name,
            item.line_price().to_fixed(),
            item.product.id
        );
    }
    println!("  total {:>47}", cart.total_price().to_fixed());
}

#[allow(clippy::print_stdout)]
fn print_wishlist(owner: UserId, wishlist: &CollectionState<Wishlist>) {
    println!("Wishlist for {owner} ({} items)", wishlist.len());
    for product in wishlist.list() {
        println!(
            "  {:<38} {:>10}  [{}]",
            product.name,
            product.price.to_fixed(),
            product.id
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_updated(kind: CollectionKind, updated: Option<DateTime<Utc>>) {
    match updated {
        Some(at) => println!("{} last updated {}", kind.title(), at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("{} has never been saved", kind.title()),
    }
}
